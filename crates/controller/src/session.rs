//! Per-controller session state.

use acctbatch_core::results::ResultsView;
use acctbatch_core::session::SessionPhase;
use acctbatch_core::types::{ProcessId, ResultKind};

use crate::poller::PollHandle;

/// State of the single job a controller tracks.
///
/// `process_id` is set exactly while a submitted job has not been reset
/// or cancelled; `is_processing` gates every poll result.
#[derive(Debug, Default)]
pub struct Session {
    pub phase: SessionPhase,
    pub process_id: Option<ProcessId>,
    pub is_processing: bool,
    pub poller: Option<PollHandle>,
    /// Rendered results, present once the job completed.
    pub results: Option<ResultsView>,
    pub active_tab: ResultKind,
    /// Bumped by every submission and every clear, so a submission can
    /// tell whether the session it started is still current.
    pub generation: u64,
}

impl Session {
    /// The running job, if any.
    pub fn active_job(&self) -> Option<&ProcessId> {
        self.process_id.as_ref().filter(|_| self.is_processing)
    }

    /// Whether a result for `process_id` should still be acted on.
    pub fn is_live(&self, process_id: &ProcessId) -> bool {
        self.active_job() == Some(process_id)
    }

    pub fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
    }

    /// Drop the job and everything derived from it.
    pub fn clear(&mut self) {
        self.stop_polling();
        self.process_id = None;
        self.is_processing = false;
        self.results = None;
        self.active_tab = ResultKind::Success;
        self.generation += 1;
    }
}
