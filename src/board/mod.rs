pub mod types;
pub mod layout;
pub mod moves;
pub mod assignment;
pub mod drag;
pub mod ordering;
pub mod roster;
pub mod view;

pub use types::{AssignError, CapabilityTag, Origin, Slot, SlotId, Token, TokenId};
pub use layout::{Layout, DEFAULT_LINES};
pub use moves::Move;
pub use assignment::AssignmentBoard;
pub use drag::DragSession;
pub use ordering::OrderingList;
pub use roster::{ListSource, RosterSelection, TagCounts};
pub use view::{handle, render, render_roster, BoardView, Gesture, Outcome, RosterView};
