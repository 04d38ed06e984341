use std::collections::HashMap;

use serde::Serialize;

use super::types::{SlotId, TokenId};

/// One token changing place as part of a board mutation
/// `from == None` means the token came from the pool, `to == None` means it returns there
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Move {
    pub token_id: TokenId,
    pub from: Option<SlotId>,
    pub to: Option<SlotId>,
}

impl Move {
    pub fn displace(token_id: &str, from: &str) -> Self {
        Move {
            token_id: token_id.to_string(),
            from: Some(from.to_string()),
            to: None,
        }
    }

    pub fn between(token_id: &str, from: Option<&str>, to: &str) -> Self {
        Move {
            token_id: token_id.to_string(),
            from: from.map(str::to_string),
            to: Some(to.to_string()),
        }
    }
}

/// Slots whose rendering changes when the moves are applied
pub fn touched_slots(moves: &[Move]) -> Vec<SlotId> {
    let mut slots: Vec<SlotId> = Vec::new();
    for mv in moves {
        for slot in [&mv.from, &mv.to].into_iter().flatten() {
            if !slots.contains(slot) {
                slots.push(slot.clone());
            }
        }
    }
    slots
}

/// Applies a set of moves to both assignment indexes in one step
/// All sources are vacated before any destination is filled, so a swap
/// (A: S1 -> S2, B: S2 -> S1) never sees one slot holding two tokens
pub fn apply_moves(
    moves: &[Move],
    occupants: &mut HashMap<SlotId, TokenId>,
    placements: &mut HashMap<TokenId, SlotId>,
) {
    for mv in moves {
        if let Some(from) = &mv.from {
            // Verify we're moving the correct token
            match occupants.get(from) {
                Some(current) if *current == mv.token_id => {
                    occupants.remove(from);
                }
                _ => {
                    log::warn!("token {} is not in slot {}, skipping vacate", mv.token_id, from);
                }
            }
        }
        placements.remove(&mv.token_id);
    }

    for mv in moves {
        if let Some(to) = &mv.to {
            occupants.insert(to.clone(), mv.token_id.clone());
            placements.insert(mv.token_id.clone(), to.clone());
        }
    }
}
