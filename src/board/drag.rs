use serde::Serialize;

use super::assignment::AssignmentBoard;
use super::moves::Move;
use super::types::{AssignError, Origin, TokenId};

/// A drag gesture in progress: what is being dragged and where it started
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DragSession {
    pub token_id: TokenId,
    pub origin: Origin,
}

impl AssignmentBoard {
    /// Records the source of a drag. Dragging from the pool also moves the selection cursor.
    pub fn drag_start(&mut self, token_id: &str, origin: Origin) -> Result<(), AssignError> {
        if self.token(token_id).is_none() {
            return Err(AssignError::UnknownToken(token_id.to_string()));
        }
        if origin == Origin::Pool {
            self.selection = Some(token_id.to_string());
        }
        log::debug!("drag start {} from {:?}", token_id, origin);
        self.drag = Some(DragSession {
            token_id: token_id.to_string(),
            origin,
        });
        Ok(())
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    /// Resolves a drop against the remembered drag source, or against the
    /// selection cursor when no drag is in progress. The session ends either way.
    pub fn drop_on(&mut self, slot_id: &str) -> Result<Vec<Move>, AssignError> {
        match self.drag.take() {
            Some(session) => self.place_from(&session.token_id, &session.origin, slot_id),
            None => self.place_selected(slot_id),
        }
    }

    /// Ends a drag without a drop; returns whether a session was cancelled
    pub fn drag_end(&mut self) -> bool {
        self.drag.take().is_some()
    }
}
