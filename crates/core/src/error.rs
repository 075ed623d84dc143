use crate::session::{SessionEvent, SessionPhase};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid session transition: {event:?} while {from:?}")]
    InvalidTransition {
        from: SessionPhase,
        event: SessionEvent,
    },
}
