//! Session phase machine.
//!
//! One session covers one job: the file is uploaded, the job is started
//! and polled, and the session ends either complete or cancelled. A new
//! submission starts a fresh session from any resting phase.

use crate::error::CoreError;

/// Where the current session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Upload panel shown, nothing submitted.
    #[default]
    Idle,
    /// Upload or job start in flight.
    Uploading,
    /// Job running, progress being polled.
    Processing,
    /// Job finished and results rendered.
    Complete,
    /// Job cancelled at the user's request.
    Cancelled,
}

/// Inputs that move a session between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A valid file was submitted.
    Submit,
    /// Upload and job start both succeeded.
    Started,
    /// Upload or job start failed.
    SubmitFailed,
    /// A poll reported the job as complete.
    Completed,
    /// The backend acknowledged a cancellation.
    Cancelled,
    /// The user asked for a fresh session.
    Reset,
}

impl SessionPhase {
    /// Apply an event, returning the next phase.
    pub fn transition(self, event: SessionEvent) -> Result<SessionPhase, CoreError> {
        use SessionEvent as E;
        use SessionPhase as P;

        let next = match (self, event) {
            (P::Idle | P::Complete | P::Cancelled, E::Submit) => P::Uploading,
            (P::Uploading, E::Started) => P::Processing,
            (P::Uploading, E::SubmitFailed) => P::Idle,
            (P::Processing, E::Completed) => P::Complete,
            (P::Processing, E::Cancelled) => P::Cancelled,
            (_, E::Reset) => P::Idle,
            (from, event) => return Err(CoreError::InvalidTransition { from, event }),
        };
        Ok(next)
    }

    /// Complete and Cancelled end a session for its process id.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn happy_path_reaches_complete() {
        let phase = SessionPhase::Idle
            .transition(SessionEvent::Submit)
            .and_then(|p| p.transition(SessionEvent::Started))
            .and_then(|p| p.transition(SessionEvent::Completed))
            .unwrap();
        assert_eq!(phase, SessionPhase::Complete);
        assert!(phase.is_terminal());
    }

    #[test]
    fn failed_submit_returns_to_idle() {
        let phase = SessionPhase::Uploading
            .transition(SessionEvent::SubmitFailed)
            .unwrap();
        assert_eq!(phase, SessionPhase::Idle);
    }

    #[test]
    fn cancel_only_from_processing() {
        assert_eq!(
            SessionPhase::Processing
                .transition(SessionEvent::Cancelled)
                .unwrap(),
            SessionPhase::Cancelled
        );
        assert_matches!(
            SessionPhase::Idle.transition(SessionEvent::Cancelled),
            Err(CoreError::InvalidTransition {
                from: SessionPhase::Idle,
                event: SessionEvent::Cancelled
            })
        );
    }

    #[test]
    fn reset_is_always_allowed() {
        for phase in [
            SessionPhase::Idle,
            SessionPhase::Uploading,
            SessionPhase::Processing,
            SessionPhase::Complete,
            SessionPhase::Cancelled,
        ] {
            assert_eq!(phase.transition(SessionEvent::Reset).unwrap(), SessionPhase::Idle);
        }
    }

    #[test]
    fn cannot_submit_while_processing() {
        assert_matches!(
            SessionPhase::Processing.transition(SessionEvent::Submit),
            Err(CoreError::InvalidTransition { .. })
        );
        assert_matches!(
            SessionPhase::Uploading.transition(SessionEvent::Submit),
            Err(CoreError::InvalidTransition { .. })
        );
    }

    #[test]
    fn new_session_after_terminal_phase() {
        assert_eq!(
            SessionPhase::Complete
                .transition(SessionEvent::Submit)
                .unwrap(),
            SessionPhase::Uploading
        );
    }
}
