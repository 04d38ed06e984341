use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ordering::OrderingList;
use super::types::{CapabilityTag, Token, TokenId};

/// Where a token dragged onto the selected list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSource {
    Pool,
    Selected,
}

/// Number of selected tokens per capability
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagCounts {
    pub f: usize,
    pub d: usize,
    pub g: usize,
}

/// Roster page: pick players from the pools into an ordered selection
#[derive(Debug, Clone)]
pub struct RosterSelection {
    tokens: Vec<Token>,
    token_index: HashMap<TokenId, usize>,
    ordering: OrderingList,
    hide_selected: bool,
    search: String,
}

impl RosterSelection {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut unique: Vec<Token> = Vec::with_capacity(tokens.len());
        let mut token_index = HashMap::new();
        for token in tokens {
            if token_index.contains_key(&token.id) {
                continue;
            }
            token_index.insert(token.id.clone(), unique.len());
            unique.push(token);
        }
        let ordering = OrderingList::new(unique.iter().map(|t| t.id.clone()));
        RosterSelection {
            tokens: unique,
            token_index,
            ordering,
            hide_selected: false,
            search: String::new(),
        }
    }

    /// Creates the selection from the server-rendered checked players, in the given order
    pub fn hydrate<I, S>(tokens: Vec<Token>, checked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roster = RosterSelection::new(tokens);
        for id in checked {
            roster.add(id.as_ref());
        }
        roster
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: &str) -> Option<&Token> {
        self.token_index.get(id).map(|&i| &self.tokens[i])
    }

    pub fn ordering(&self) -> &OrderingList {
        &self.ordering
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.ordering.contains(id)
    }

    /// Click on a pool item
    pub fn toggle(&mut self, id: &str) -> bool {
        let selected = self.ordering.toggle(id);
        log::debug!("roster toggle {} -> {}", id, selected);
        selected
    }

    pub fn add(&mut self, id: &str) {
        self.ordering.add(id);
    }

    pub fn remove(&mut self, id: &str) {
        self.ordering.remove(id);
    }

    pub fn select_all(&mut self) {
        self.ordering.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.ordering.deselect_all();
    }

    pub fn set_order_input(&mut self, id: &str, raw: &str) {
        self.ordering.set_order_input(id, raw);
        self.ordering.normalize();
    }

    /// Drop onto the selected list: pool items are added, selected items move to the end
    pub fn drop_on_selected(&mut self, id: &str, source: ListSource) {
        match source {
            ListSource::Pool => self.add(id),
            ListSource::Selected => self.ordering.move_to_end(id),
        }
    }

    /// Selected tokens in order
    pub fn selected(&self) -> Vec<&Token> {
        self.ordering
            .serialize()
            .iter()
            .filter_map(|id| self.token(id))
            .collect()
    }

    pub fn counts(&self) -> TagCounts {
        let mut counts = TagCounts::default();
        for token in self.selected() {
            match token.capability_tag {
                CapabilityTag::F => counts.f += 1,
                CapabilityTag::D => counts.d += 1,
                CapabilityTag::G => counts.g += 1,
            }
        }
        counts
    }

    pub fn set_hide_selected(&mut self, hide: bool) {
        self.hide_selected = hide;
    }

    pub fn hide_selected(&self) -> bool {
        self.hide_selected
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.trim().to_lowercase();
    }

    /// Whether a pool item is shown: it matches the search and is not hidden as selected
    pub fn is_visible(&self, id: &str) -> bool {
        let Some(token) = self.token(id) else {
            return false;
        };
        let matches = self.search.is_empty() || token.display_name.to_lowercase().contains(&self.search);
        matches && !(self.hide_selected && self.is_selected(id))
    }

    /// Value of the hidden order field
    pub fn field_value(&self) -> String {
        self.ordering.to_field_value()
    }
}
