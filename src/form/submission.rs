use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::board::{Layout, SlotId, Token, TokenId};

/// Lineup accepted from a lines form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedLineup {
    pub timestamp: String,
    pub assignments: Vec<(SlotId, TokenId)>, // layout order
    pub order: Vec<TokenId>,
}

/// Roster accepted from a roster form submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedRoster {
    pub timestamp: String,
    pub order: Vec<TokenId>,
}

fn find_token<'a>(tokens: &'a [Token], id: &str) -> Option<&'a Token> {
    tokens.iter().find(|t| t.id == id)
}

/// Validates the `slot=player` fields of a lines form submission
///
/// Empty values are unfilled slots. Fields that are not slots of the layout are ignored.
/// Returns the filled slots in layout order.
pub fn validate_lines_submission(
    layout: &Layout,
    tokens: &[Token],
    fields: &HashMap<String, String>,
) -> Result<Vec<(SlotId, TokenId)>, String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut assignments = Vec::new();

    for slot in layout.slots() {
        let value = match fields.get(&slot.id) {
            Some(v) => v.trim(),
            None => continue,
        };
        if value.is_empty() {
            continue;
        }

        let token = find_token(tokens, value)
            .ok_or_else(|| format!("Unknown player {} in slot {}", value, slot.id))?;

        if token.capability_tag != slot.accept_tag {
            return Err(format!(
                "{} plays {} and cannot fill {} slot {}",
                token.display_name, token.capability_tag, slot.accept_tag, slot.id
            ));
        }

        if !seen.insert(value) {
            return Err(format!("{} is assigned to more than one slot", token.display_name));
        }

        assignments.push((slot.id.clone(), token.id.clone()));
    }

    Ok(assignments)
}

/// Validates the joined order field of a roster or lines form submission
pub fn validate_order_field(tokens: &[Token], value: &str) -> Result<Vec<TokenId>, String> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();

    for id in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if find_token(tokens, id).is_none() {
            return Err(format!("Unknown player {}", id));
        }
        if !seen.insert(id) {
            return Err(format!("Player {} is listed twice", id));
        }
        order.push(id.to_string());
    }

    Ok(order)
}

/// Validates the order field of a lines submission; it may only name assigned players
pub fn validate_lineup_order(
    tokens: &[Token],
    assignments: &[(SlotId, TokenId)],
    value: &str,
) -> Result<Vec<TokenId>, String> {
    let order = validate_order_field(tokens, value)?;
    if let Some(id) = order.iter().find(|id| !assignments.iter().any(|(_, t)| t == *id)) {
        return Err(format!("Player {} is ordered but not assigned", id));
    }
    Ok(order)
}
