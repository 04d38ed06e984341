//! Rendering adapter between the board and the page.
//!
//! `render` projects board state onto plain view models (slot contents, pool
//! badges, CSS state classes, hidden input values). `handle` translates page
//! gestures back into board calls. Neither holds state of its own.

use serde::{Deserialize, Serialize};

use super::assignment::AssignmentBoard;
use super::roster::{RosterSelection, TagCounts};
use super::moves::{touched_slots, Move};
use super::types::{AssignError, CapabilityTag, Origin, SlotId, TokenId};

pub const CLASS_SELECTED: &str = "is-selected";
pub const CLASS_ASSIGNED: &str = "is-assigned";
pub const CLASS_HIDDEN: &str = "is-hidden";

#[derive(Debug, Clone, Serialize)]
pub struct OccupantView {
    pub token_id: TokenId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotView {
    pub id: SlotId,
    pub accept: CapabilityTag,
    pub group: Option<String>,
    pub occupant: Option<OccupantView>,
    pub placeholder: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolItemView {
    pub id: TokenId,
    pub name: String,
    pub tag: CapabilityTag,
    pub badge: String,
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolView {
    pub tag: CapabilityTag,
    pub items: Vec<PoolItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub slots: Vec<SlotView>,
    pub pools: Vec<PoolView>,
    pub selected: Option<TokenId>,
    pub hide_assigned: bool,
    pub fields: Vec<(SlotId, String)>,
}

/// Projects the board onto view models
pub fn render(board: &AssignmentBoard) -> BoardView {
    let slots = board
        .layout()
        .slots()
        .iter()
        .map(|slot| {
            let occupant = board.occupant(&slot.id).map(|t| OccupantView {
                token_id: t.id.clone(),
                name: t.display_name.clone(),
            });
            let placeholder = match occupant {
                Some(_) => None,
                None => Some(slot.accept_tag.placeholder()),
            };
            SlotView {
                id: slot.id.clone(),
                accept: slot.accept_tag,
                group: slot.group.clone(),
                occupant,
                placeholder,
            }
        })
        .collect();

    let pools = CapabilityTag::ALL
        .iter()
        .map(|&tag| PoolView {
            tag,
            items: board.pool(tag).map(|t| pool_item(board, &t.id)).collect(),
        })
        .collect();

    BoardView {
        slots,
        pools,
        selected: board.selected().map(|t| t.id.clone()),
        hide_assigned: board.hide_assigned(),
        fields: board.form_fields(),
    }
}

/// View of one pool item; `None` for unknown ids
pub fn render_pool_item(board: &AssignmentBoard, token_id: &str) -> Option<PoolItemView> {
    board.token(token_id).map(|t| pool_item(board, &t.id))
}

fn pool_item(board: &AssignmentBoard, token_id: &str) -> PoolItemView {
    let mut classes = Vec::new();
    if board.is_selected(token_id) {
        classes.push(CLASS_SELECTED.to_string());
    }
    if let Some(slot) = board.slot_of(token_id) {
        classes.push(CLASS_ASSIGNED.to_string());
        // Line accent class, e.g. "ln2"
        if let Some(group) = &slot.group {
            classes.push(format!("ln{}", group));
        }
    }
    if board.is_hidden(token_id) {
        classes.push(CLASS_HIDDEN.to_string());
    }

    let (name, tag) = board
        .token(token_id)
        .map(|t| (t.display_name.clone(), t.capability_tag))
        .unwrap_or_else(|| (String::new(), CapabilityTag::F));
    PoolItemView {
        id: token_id.to_string(),
        name,
        tag,
        badge: board.badge(token_id),
        classes,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterItemView {
    pub id: TokenId,
    pub name: String,
    pub tag: CapabilityTag,
    pub selected: bool,
    pub visible: bool,
    pub order: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterPoolView {
    pub tag: CapabilityTag,
    pub items: Vec<RosterItemView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterView {
    pub pools: Vec<RosterPoolView>,
    pub selected: Vec<TokenId>,
    pub counts: TagCounts,
    pub hide_selected: bool,
    pub field: String,
}

/// Projects the roster page onto view models
pub fn render_roster(roster: &RosterSelection) -> RosterView {
    let pools = CapabilityTag::ALL
        .iter()
        .map(|&tag| RosterPoolView {
            tag,
            items: roster
                .tokens()
                .iter()
                .filter(|t| t.capability_tag == tag)
                .map(|t| RosterItemView {
                    id: t.id.clone(),
                    name: t.display_name.clone(),
                    tag,
                    selected: roster.is_selected(&t.id),
                    visible: roster.is_visible(&t.id),
                    order: roster.ordering().order_input(&t.id).map(str::to_string),
                })
                .collect(),
        })
        .collect();

    RosterView {
        pools,
        selected: roster.selected().iter().map(|t| t.id.clone()).collect(),
        counts: roster.counts(),
        hide_selected: roster.hide_selected(),
        field: roster.field_value(),
    }
}

/// Interactions the page forwards to the board
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "gesture", rename_all = "snake_case")]
pub enum Gesture {
    /// Click on a pool item (select / deselect)
    PoolClick { token_id: TokenId },
    /// Key press on a focused pool item
    PoolKey { token_id: TokenId, key: String },
    DragStart { token_id: TokenId, origin: Origin },
    Drop { slot_id: SlotId },
    DragEnd,
    /// Key press on a focused slot
    SlotKey { slot_id: SlotId, key: String },
    /// Key press on a slot's occupant
    OccupantKey { slot_id: SlotId, key: String },
    /// The remove button of a slot's occupant
    RemoveClick { slot_id: SlotId },
    HideAssigned { enabled: bool },
    ClearAll,
}

/// What a gesture did
#[derive(Debug, Clone, Default, Serialize)]
pub struct Outcome {
    pub moves: Vec<Move>,
    pub changed_slots: Vec<SlotId>,
    #[serde(skip)]
    pub error: Option<AssignError>,
}

impl Outcome {
    fn from_moves(moves: Vec<Move>) -> Self {
        let changed_slots = touched_slots(&moves);
        Outcome {
            moves,
            changed_slots,
            error: None,
        }
    }

    pub fn from_result(result: Result<Vec<Move>, AssignError>) -> Self {
        match result {
            Ok(moves) => Outcome::from_moves(moves),
            Err(e) => Outcome {
                error: Some(e),
                ..Outcome::default()
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

fn is_activate_key(key: &str) -> bool {
    key == "Enter" || key == " "
}

fn is_remove_key(key: &str) -> bool {
    key == "Delete" || key == "Backspace"
}

/// Translates a gesture into board calls
pub fn handle(board: &mut AssignmentBoard, gesture: Gesture) -> Outcome {
    match gesture {
        Gesture::PoolClick { token_id } => match board.select(&token_id) {
            Ok(()) => Outcome::default(),
            Err(e) => Outcome::from_result(Err(e)),
        },
        Gesture::PoolKey { token_id, key } => {
            if is_activate_key(&key) {
                handle(board, Gesture::PoolClick { token_id })
            } else {
                Outcome::default()
            }
        }
        Gesture::DragStart { token_id, origin } => match board.drag_start(&token_id, origin) {
            Ok(()) => Outcome::default(),
            Err(e) => Outcome::from_result(Err(e)),
        },
        Gesture::Drop { slot_id } => Outcome::from_result(board.drop_on(&slot_id)),
        Gesture::DragEnd => {
            board.drag_end();
            Outcome::default()
        }
        Gesture::SlotKey { slot_id, key } => {
            if is_activate_key(&key) {
                Outcome::from_result(board.place_selected(&slot_id))
            } else {
                Outcome::default()
            }
        }
        Gesture::OccupantKey { slot_id, key } => {
            if is_remove_key(&key) {
                handle(board, Gesture::RemoveClick { slot_id })
            } else {
                Outcome::default()
            }
        }
        Gesture::RemoveClick { slot_id } => {
            let moves = board
                .clear(&slot_id)
                .map(|token_id| vec![Move::displace(&token_id, &slot_id)])
                .unwrap_or_default();
            Outcome::from_moves(moves)
        }
        Gesture::HideAssigned { enabled } => {
            board.set_hide_assigned(enabled);
            Outcome::default()
        }
        Gesture::ClearAll => Outcome::from_moves(board.clear_all()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Layout, Token};

    fn board() -> AssignmentBoard {
        AssignmentBoard::new(
            Layout::lines(2),
            vec![
                Token::new("p7", "Novak", CapabilityTag::F),
                Token::new("p8", "Dvorak", CapabilityTag::F),
                Token::new("d1", "Cerny", CapabilityTag::D),
            ],
        )
    }

    #[test]
    fn render_shows_occupant_and_placeholders() {
        let mut board = board();
        board.place("p7", "L2LW").unwrap();
        let view = render(&board);

        let filled = view.slots.iter().find(|s| s.id == "L2LW").unwrap();
        assert_eq!(filled.occupant.as_ref().map(|o| o.name.as_str()), Some("Novak"));
        assert!(filled.placeholder.is_none());

        let empty = view.slots.iter().find(|s| s.id == "D1LD").unwrap();
        assert_eq!(empty.placeholder, Some(CapabilityTag::D.placeholder()));
    }

    #[test]
    fn pool_items_carry_badges_and_classes() {
        let mut board = board();
        board.place("p7", "L2LW").unwrap();
        board.select("p8").unwrap();
        board.set_hide_assigned(true);

        let item = render_pool_item(&board, "p7").unwrap();
        assert_eq!(item.badge, "2");
        assert!(item.classes.contains(&"ln2".to_string()));
        assert!(item.classes.contains(&CLASS_HIDDEN.to_string()));

        let selected = render_pool_item(&board, "p8").unwrap();
        assert_eq!(selected.classes, vec![CLASS_SELECTED.to_string()]);
        assert_eq!(selected.badge, "—");
    }

    #[test]
    fn keyboard_flow_matches_drag_flow() {
        let mut board = board();
        handle(&mut board, Gesture::PoolKey { token_id: "p8".into(), key: "Enter".into() });
        let outcome = handle(&mut board, Gesture::SlotKey { slot_id: "L1C".into(), key: " ".into() });
        assert!(outcome.is_ok());
        assert_eq!(outcome.changed_slots, vec!["L1C".to_string()]);

        let outcome = handle(&mut board, Gesture::OccupantKey { slot_id: "L1C".into(), key: "Delete".into() });
        assert_eq!(outcome.changed_slots, vec!["L1C".to_string()]);
        assert!(board.assignments().is_empty());
    }

    #[test]
    fn rejected_drop_reports_error_and_changes_nothing() {
        let mut board = board();
        handle(&mut board, Gesture::DragStart { token_id: "d1".into(), origin: Origin::Pool });
        let outcome = handle(&mut board, Gesture::Drop { slot_id: "L1C".into() });
        assert!(matches!(outcome.error, Some(AssignError::CapabilityMismatch { .. })));
        assert!(outcome.changed_slots.is_empty());
        assert!(board.assignments().is_empty());
    }

    #[test]
    fn gestures_deserialize_from_page_json() {
        let gesture: Gesture = serde_json::from_str(
            r#"{"gesture":"drag_start","token_id":"p7","origin":{"kind":"slot","slot":"L1C"}}"#,
        )
        .unwrap();
        assert_eq!(
            gesture,
            Gesture::DragStart { token_id: "p7".into(), origin: Origin::Slot("L1C".into()) }
        );
        let gesture: Gesture = serde_json::from_str(r#"{"gesture":"drag_end"}"#).unwrap();
        assert_eq!(gesture, Gesture::DragEnd);
    }
    #[test]
    fn roster_view_lists_selection_in_order() {
        let mut roster = RosterSelection::new(vec![
            Token::new("1", "Jagr", CapabilityTag::F),
            Token::new("2", "Hasek", CapabilityTag::G),
            Token::new("3", "Chara", CapabilityTag::D),
        ]);
        roster.toggle("2");
        roster.toggle("1");
        roster.set_hide_selected(true);

        let view = render_roster(&roster);
        assert_eq!(view.selected, vec!["2".to_string(), "1".to_string()]);
        assert_eq!(view.field, "2,1");
        assert_eq!(view.counts, TagCounts { f: 1, d: 0, g: 1 });

        let forwards = &view.pools[0];
        assert_eq!(forwards.tag, CapabilityTag::F);
        assert!(forwards.items[0].selected);
        assert!(!forwards.items[0].visible);
        assert_eq!(forwards.items[0].order.as_deref(), Some("2"));
    }
}
