use std::collections::{BTreeMap, HashMap};

use super::drag::DragSession;
use super::layout::Layout;
use super::moves::{apply_moves, Move};
use super::ordering::OrderingList;
use super::types::{AssignError, CapabilityTag, Origin, Slot, SlotId, Token, TokenId};

/// Badge shown next to a pool token that is not in any slot
pub const UNASSIGNED_BADGE: &str = "—";

/// Assignment of tokens to the slots of one layout
///
/// Holds both indexes of the relation (slot -> occupant and token -> slot) and
/// the transient interaction state of one page instance: the selection cursor,
/// the drag session and the hide-assigned toggle.
#[derive(Debug, Clone)]
pub struct AssignmentBoard {
    layout: Layout,
    tokens: Vec<Token>,
    token_index: HashMap<TokenId, usize>,
    occupants: HashMap<SlotId, TokenId>,
    placements: HashMap<TokenId, SlotId>,
    pub(super) selection: Option<TokenId>,
    pub(super) drag: Option<DragSession>,
    hide_assigned: bool,
    ordering: Option<OrderingList>,
}

impl AssignmentBoard {
    /// Creates an empty board. Tokens keep their listing order, later duplicates are dropped.
    pub fn new(layout: Layout, tokens: Vec<Token>) -> Self {
        let mut unique = Vec::with_capacity(tokens.len());
        let mut token_index = HashMap::new();
        for token in tokens {
            if token_index.contains_key(&token.id) {
                log::warn!("duplicate token id {}, ignoring", token.id);
                continue;
            }
            token_index.insert(token.id.clone(), unique.len());
            unique.push(token);
        }

        AssignmentBoard {
            layout,
            tokens: unique,
            token_index,
            occupants: HashMap::new(),
            placements: HashMap::new(),
            selection: None,
            drag: None,
            hide_assigned: false,
            ordering: None,
        }
    }

    /// Creates a board from the page's rendered initial state
    /// Pairs that fail validation are skipped; a slot filled by an earlier pair keeps its occupant
    pub fn hydrate<I, S, T>(layout: Layout, tokens: Vec<Token>, initial: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut board = AssignmentBoard::new(layout, tokens);
        for (slot_id, token_id) in initial {
            let (slot_id, token_id) = (slot_id.as_ref(), token_id.as_ref());
            if token_id.is_empty() {
                continue;
            }
            if board.occupants.contains_key(slot_id) {
                log::warn!("slot {} already filled, skipping initial token {}", slot_id, token_id);
                continue;
            }
            if let Err(e) = board.place(token_id, slot_id) {
                log::warn!("skipping initial assignment {}={}: {}", slot_id, token_id, e);
            }
        }
        board
    }

    /// Attaches an ordering list over the tokens, kept in sync with the assigned set
    pub fn with_ordering(self) -> Self {
        self.with_ordering_from(&[])
    }

    /// Like `with_ordering`, but assigned tokens named in `order` lead in that order
    /// Remaining assigned tokens follow in layout order
    pub fn with_ordering_from(mut self, order: &[TokenId]) -> Self {
        let mut ordering = OrderingList::new(self.tokens.iter().map(|t| t.id.clone()));
        for id in order.iter().filter(|id| self.is_assigned(id)) {
            ordering.add(id);
        }
        ordering.sync(self.assigned_in_layout_order().iter().map(|t| t.as_str()));
        self.ordering = Some(ordering);
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn token(&self, id: &str) -> Option<&Token> {
        self.token_index.get(id).map(|&i| &self.tokens[i])
    }

    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.layout.slot(id)
    }

    /// Token currently sitting in a slot
    pub fn occupant(&self, slot_id: &str) -> Option<&Token> {
        self.occupants.get(slot_id).and_then(|id| self.token(id))
    }

    /// Slot a token currently sits in
    pub fn slot_of(&self, token_id: &str) -> Option<&Slot> {
        self.placements.get(token_id).and_then(|id| self.layout.slot(id))
    }

    pub fn is_assigned(&self, token_id: &str) -> bool {
        self.placements.contains_key(token_id)
    }

    /// Tokens of one capability, in listing order (the pool they are dragged from)
    pub fn pool(&self, tag: CapabilityTag) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(move |t| t.capability_tag == tag)
    }

    pub fn ordering(&self) -> Option<&OrderingList> {
        self.ordering.as_ref()
    }

    /// Places a token dragged from the pool
    pub fn place(&mut self, token_id: &str, slot_id: &str) -> Result<Vec<Move>, AssignError> {
        self.place_from(token_id, &Origin::Pool, slot_id)
    }

    /// Places a token, swapping with the destination's occupant when the
    /// gesture started in the slot the token currently occupies
    pub fn place_from(
        &mut self,
        token_id: &str,
        origin: &Origin,
        slot_id: &str,
    ) -> Result<Vec<Move>, AssignError> {
        let moves = match self.plan_place(token_id, origin, slot_id) {
            Ok(moves) => moves,
            Err(e) => {
                log::debug!("rejected placement of {} into {}: {}", token_id, slot_id, e);
                return Err(e);
            }
        };

        apply_moves(&moves, &mut self.occupants, &mut self.placements);
        self.selection = None;
        self.sync_ordering();
        log::debug!("placed {} into {} ({} moves)", token_id, slot_id, moves.len());
        Ok(moves)
    }

    /// Computes the moves a placement needs without touching the board
    pub fn plan_place(
        &self,
        token_id: &str,
        origin: &Origin,
        slot_id: &str,
    ) -> Result<Vec<Move>, AssignError> {
        let token = self
            .token(token_id)
            .ok_or_else(|| AssignError::UnknownToken(token_id.to_string()))?;
        let slot = self
            .layout
            .slot(slot_id)
            .ok_or_else(|| AssignError::UnknownSlot(slot_id.to_string()))?;
        if token.capability_tag != slot.accept_tag {
            return Err(AssignError::CapabilityMismatch {
                token: token_id.to_string(),
                slot: slot_id.to_string(),
            });
        }

        let current = self.placements.get(token_id).map(String::as_str);
        if current == Some(slot_id) {
            // Dropped onto the slot it already occupies
            return Ok(Vec::new());
        }

        // A slot origin only counts while that slot still holds the token
        let source_slot = match origin {
            Origin::Slot(src) if current == Some(src.as_str()) => Some(src.as_str()),
            _ => None,
        };

        let mut moves = Vec::new();
        match (self.occupants.get(slot_id), source_slot) {
            (Some(other), Some(src)) => {
                // Both slots accept the moving token's tag, so the occupant fits the source
                moves.push(Move::between(token_id, Some(src), slot_id));
                moves.push(Move::between(other, Some(slot_id), src));
            }
            (Some(other), None) => {
                moves.push(Move::displace(other, slot_id));
                moves.push(Move::between(token_id, current, slot_id));
            }
            (None, _) => {
                moves.push(Move::between(token_id, current, slot_id));
            }
        }
        Ok(moves)
    }

    /// Vacates a slot; clearing an empty or unknown slot does nothing
    pub fn clear(&mut self, slot_id: &str) -> Option<TokenId> {
        let token_id = self.occupants.get(slot_id)?.clone();
        apply_moves(
            &[Move::displace(&token_id, slot_id)],
            &mut self.occupants,
            &mut self.placements,
        );
        self.sync_ordering();
        log::debug!("cleared slot {} (freed {})", slot_id, token_id);
        Some(token_id)
    }

    /// Vacates every slot
    pub fn clear_all(&mut self) -> Vec<Move> {
        let moves: Vec<Move> = self
            .assignments()
            .into_iter()
            .map(|(slot_id, token_id)| Move::displace(&token_id, &slot_id))
            .collect();
        apply_moves(&moves, &mut self.occupants, &mut self.placements);
        self.sync_ordering();
        moves
    }

    /// Selects a token for click/keyboard placement; selecting the selected token deselects it
    pub fn select(&mut self, token_id: &str) -> Result<(), AssignError> {
        if self.token(token_id).is_none() {
            return Err(AssignError::UnknownToken(token_id.to_string()));
        }
        if self.selection.as_deref() == Some(token_id) {
            self.selection = None;
        } else {
            self.selection = Some(token_id.to_string());
        }
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.selection = None;
    }

    pub fn selected(&self) -> Option<&Token> {
        self.selection.as_deref().and_then(|id| self.token(id))
    }

    pub fn is_selected(&self, token_id: &str) -> bool {
        self.selection.as_deref() == Some(token_id)
    }

    /// Places the selected token
    pub fn place_selected(&mut self, slot_id: &str) -> Result<Vec<Move>, AssignError> {
        let token_id = self.selection.clone().ok_or(AssignError::NoSelection)?;
        self.place(&token_id, slot_id)
    }

    /// Full assignment, one entry per slot
    pub fn serialize(&self) -> BTreeMap<SlotId, Option<TokenId>> {
        self.layout
            .slots()
            .iter()
            .map(|s| (s.id.clone(), self.occupants.get(&s.id).cloned()))
            .collect()
    }

    /// Values of the hidden per-slot form inputs, in layout order
    pub fn form_fields(&self) -> Vec<(SlotId, String)> {
        self.layout
            .slots()
            .iter()
            .map(|s| (s.id.clone(), self.occupants.get(&s.id).cloned().unwrap_or_default()))
            .collect()
    }

    /// Filled slots in layout order
    pub fn assignments(&self) -> Vec<(SlotId, TokenId)> {
        self.layout
            .slots()
            .iter()
            .filter_map(|s| self.occupants.get(&s.id).map(|t| (s.id.clone(), t.clone())))
            .collect()
    }

    pub fn set_hide_assigned(&mut self, hide: bool) {
        self.hide_assigned = hide;
    }

    pub fn hide_assigned(&self) -> bool {
        self.hide_assigned
    }

    /// Whether a token's pool listing is currently filtered out
    pub fn is_hidden(&self, token_id: &str) -> bool {
        self.hide_assigned && self.is_assigned(token_id)
    }

    /// Pool badge: the line of the token's slot, the slot id for slots outside a line
    pub fn badge(&self, token_id: &str) -> String {
        self.slot_of(token_id)
            .map(Slot::badge)
            .unwrap_or_else(|| UNASSIGNED_BADGE.to_string())
    }

    /// Both indexes describe the same relation and every placement respects capabilities
    pub fn is_consistent(&self) -> bool {
        if self.occupants.len() != self.placements.len() {
            return false;
        }
        self.occupants.iter().all(|(slot_id, token_id)| {
            let indexed = self.placements.get(token_id) == Some(slot_id);
            let fits = match (self.token(token_id), self.layout.slot(slot_id)) {
                (Some(t), Some(s)) => t.capability_tag == s.accept_tag,
                _ => false,
            };
            indexed && fits
        })
    }

    fn assigned_in_layout_order(&self) -> Vec<TokenId> {
        self.assignments().into_iter().map(|(_, t)| t).collect()
    }

    fn sync_ordering(&mut self) {
        if self.ordering.is_none() {
            return;
        }
        let assigned = self.assigned_in_layout_order();
        if let Some(ordering) = self.ordering.as_mut() {
            ordering.sync(assigned.iter().map(String::as_str));
        }
    }
}
