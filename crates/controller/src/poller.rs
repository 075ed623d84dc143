//! Fixed-period progress polling.
//!
//! A poll loop fetches the job status immediately and then once per
//! period until it is told to stop, either by its [`CancellationToken`]
//! or by the session reporting that the job is finished or no longer
//! current. Poll failures are values ([`PollOutcome::Transient`]), never
//! loop-ending errors.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use acctbatch_client::BatchApi;
use acctbatch_core::progress::ProgressSnapshot;
use acctbatch_core::types::ProcessId;

/// Result of a single status check.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The backend answered with a snapshot.
    Snapshot(ProgressSnapshot),
    /// The check failed (transport, status or decode); try again next tick.
    Transient(String),
}

/// What the loop should do after a result has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStep {
    Continue,
    /// The job finished or the result was stale; stop polling.
    Stop,
}

/// Receives poll results and decides whether polling goes on.
pub trait PollSink: Send + Sync + 'static {
    fn apply(&self, process_id: &ProcessId, outcome: PollOutcome) -> PollStep;
}

/// Fetch the current status of `process_id` once.
pub async fn poll_once(api: &dyn BatchApi, process_id: &ProcessId) -> PollOutcome {
    match api.progress(process_id).await {
        Ok(snapshot) => PollOutcome::Snapshot(snapshot),
        Err(e) => {
            tracing::warn!(process_id = %process_id, error = %e, "Progress check failed, retrying next tick");
            PollOutcome::Transient(e.to_string())
        }
    }
}

/// Handle to a running poll loop. Stopping is idempotent.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
}

impl PollHandle {
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Decrements the live-loop counter when a loop task ends, however it
/// ends.
struct LiveGuard(Arc<AtomicUsize>);

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Spawn a poll loop for `process_id`.
///
/// The first check runs immediately, later ones every `period`. A slow
/// request delays the following tick rather than overlapping it.
/// `live` counts loops that have not yet exited.
pub fn spawn_poll_loop<S: PollSink>(
    api: Arc<dyn BatchApi>,
    sink: Arc<S>,
    process_id: ProcessId,
    period: Duration,
    live: Arc<AtomicUsize>,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    live.fetch_add(1, Ordering::SeqCst);
    let guard = LiveGuard(live);

    tokio::spawn(async move {
        let _guard = guard;
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::debug!(process_id = %process_id, period_ms = period.as_millis() as u64, "Poll loop started");

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                outcome = poll_once(api.as_ref(), &process_id) => outcome,
            };

            if token.is_cancelled() {
                break;
            }

            if sink.apply(&process_id, outcome) == PollStep::Stop {
                break;
            }
        }

        tracing::debug!(process_id = %process_id, "Poll loop exited");
    });

    PollHandle { cancel }
}
