//! The upload/progress controller.
//!
//! [`UploadController`] drives one session at a time through
//! Idle -> Uploading -> Processing -> Complete (or Cancelled). All state
//! lives in the instance; the backend and the screen are injected, and
//! the poll period comes from [`ControllerConfig`].
//!
//! Every asynchronous result is checked against the session before it is
//! applied: a poll answer or a cancellation acknowledgment for a job
//! that is no longer live is dropped.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;

use acctbatch_client::{BatchApi, BatchApiError, DownloadedFile};
use acctbatch_core::error::CoreError;
use acctbatch_core::notification::{NOTIFICATION_DISPLAY, NOTIFICATION_FADE};
use acctbatch_core::progress::ProgressView;
use acctbatch_core::records::{StartJobRequest, StartJobResponse};
use acctbatch_core::results::ResultsView;
use acctbatch_core::session::{SessionEvent, SessionPhase};
use acctbatch_core::theme::Theme;
use acctbatch_core::types::{ProcessId, ResultKind, UploadFile, Workers};
use acctbatch_core::upload::{validate_spreadsheet, MSG_NO_FILE, NO_FILE_LABEL};

use crate::notifier::Notifier;
use crate::poller::{spawn_poll_loop, PollOutcome, PollSink, PollStep};
use crate::preferences::{PreferenceError, PreferenceStore};
use crate::session::Session;
use crate::view::{CancelControl, Panel, View};

/// Default time between progress checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Shortest accepted poll period.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub const MSG_CANCELLED: &str = "Processing cancelled";
pub const MSG_CANCEL_FAILED: &str = "Failed to cancel processing";
pub const MSG_DOWNLOAD_FAILED: &str = "Download failed";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing knobs for a controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub poll_interval: Duration,
    pub notification_display: Duration,
    pub notification_fade: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            notification_display: NOTIFICATION_DISPLAY,
            notification_fade: NOTIFICATION_FADE,
        }
    }
}

impl ControllerConfig {
    /// Set the poll period, raised to [`MIN_POLL_INTERVAL`] if shorter.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Which half of a submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStage {
    Upload,
    Start,
}

impl SubmitStage {
    /// Message shown when the backend gave no error text.
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Upload => "Upload failed",
            Self::Start => "Processing failed",
        }
    }
}

impl fmt::Display for SubmitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Start => f.write_str("job start"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// No file, or not a spreadsheet. Nothing was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A job is already being submitted or processed.
    #[error("A job is already in progress")]
    Busy,

    #[error("Submission failed during {stage}: {message}")]
    Submit { stage: SubmitStage, message: String },

    /// The session was reset while the submission was in flight.
    #[error("Session was reset before the job started")]
    Superseded,

    /// The backend refused or never answered the cancellation.
    #[error("Cancellation failed: {0}")]
    Cancel(String),

    #[error("No job is running")]
    NoActiveJob,

    #[error("No {0} results to download")]
    DownloadUnavailable(ResultKind),

    #[error("Download of {kind} results failed: {message}")]
    Download { kind: ResultKind, message: String },

    #[error(transparent)]
    Preferences(#[from] PreferenceError),
}

/// Text shown to the user for a backend failure.
fn user_message(error: &BatchApiError, default: &str) -> String {
    error.response_text().unwrap_or(default).to_string()
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct Inner {
    api: Arc<dyn BatchApi>,
    view: Arc<dyn View>,
    config: ControllerConfig,
    notifier: Notifier,
    session: Mutex<Session>,
    phase_tx: watch::Sender<SessionPhase>,
    live_polls: Arc<AtomicUsize>,
    preferences: Option<PreferenceStore>,
    theme: Mutex<Theme>,
}

impl Inner {
    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move the session to its next phase and publish it.
    fn advance(&self, session: &mut Session, event: SessionEvent) -> Result<(), CoreError> {
        let next = session.phase.transition(event)?;
        session.phase = next;
        self.phase_tx.send_replace(next);
        Ok(())
    }

    /// Put the screen back to a fresh upload panel.
    fn show_fresh_upload(&self) {
        self.view.set_spinner(false);
        self.view.set_loading(false);
        self.view.update_progress(&ProgressView::default());
        self.view.hide_results();
        self.view.show_tab(ResultKind::Success);
        self.view.set_cancel_control(CancelControl::Cancel);
        self.view.set_file_label(NO_FILE_LABEL);
        self.view.show_panel(Panel::Upload);
    }
}

impl PollSink for Inner {
    fn apply(&self, process_id: &ProcessId, outcome: PollOutcome) -> PollStep {
        let mut session = self.session();
        if !session.is_live(process_id) {
            tracing::debug!(process_id = %process_id, "Discarding poll result for inactive job");
            return PollStep::Stop;
        }

        let snapshot = match outcome {
            PollOutcome::Snapshot(snapshot) => snapshot,
            PollOutcome::Transient(_) => return PollStep::Continue,
        };

        self.view.update_progress(&ProgressView::from(&snapshot));
        if !snapshot.is_complete {
            return PollStep::Continue;
        }

        session.is_processing = false;
        session.stop_polling();
        if let Err(e) = self.advance(&mut session, SessionEvent::Completed) {
            tracing::warn!(process_id = %process_id, error = %e, "Unexpected transition on completion");
        }

        let results = ResultsView::from_snapshot(&snapshot);
        self.view.set_spinner(false);
        self.view.show_results(&results);
        self.view.show_tab(session.active_tab);
        self.view.set_cancel_control(CancelControl::NewSession);

        tracing::info!(
            process_id = %process_id,
            success = results.success.rows.len(),
            failed = results.fail.rows.len(),
            "Job complete",
        );

        session.results = Some(results);
        PollStep::Stop
    }
}

/// Client-side controller for one upload/progress workflow.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct UploadController {
    inner: Arc<Inner>,
}

impl UploadController {
    pub fn new(api: Arc<dyn BatchApi>, view: Arc<dyn View>, config: ControllerConfig) -> Self {
        let notifier = Notifier::new(
            Arc::clone(&view),
            config.notification_display,
            config.notification_fade,
        );
        let (phase_tx, _) = watch::channel(SessionPhase::Idle);

        Self {
            inner: Arc::new(Inner {
                api,
                view,
                config,
                notifier,
                session: Mutex::new(Session::default()),
                phase_tx,
                live_polls: Arc::new(AtomicUsize::new(0)),
                preferences: None,
                theme: Mutex::new(Theme::default()),
            }),
        }
    }

    /// Persist the theme preference in `store`.
    ///
    /// Must be called before the controller is cloned.
    pub fn with_preferences(mut self, store: PreferenceStore) -> Self {
        match Arc::get_mut(&mut self.inner) {
            Some(inner) => inner.preferences = Some(store),
            None => tracing::warn!("Controller already shared, preference store ignored"),
        }
        self
    }

    // ---- queries ----

    pub fn phase(&self) -> SessionPhase {
        self.inner.session().phase
    }

    /// Receive every phase change.
    pub fn subscribe_phase(&self) -> watch::Receiver<SessionPhase> {
        self.inner.phase_tx.subscribe()
    }

    pub fn process_id(&self) -> Option<ProcessId> {
        self.inner.session().process_id.clone()
    }

    pub fn is_processing(&self) -> bool {
        self.inner.session().is_processing
    }

    /// Number of poll loops that have not exited yet.
    pub fn live_poll_loops(&self) -> usize {
        self.inner.live_polls.load(Ordering::SeqCst)
    }

    pub fn results(&self) -> Option<ResultsView> {
        self.inner.session().results.clone()
    }

    // ---- file selection ----

    /// Reflect the chosen file in the upload panel.
    pub fn select_file(&self, file_name: Option<&str>) {
        self.inner
            .view
            .set_file_label(file_name.unwrap_or(NO_FILE_LABEL));
    }

    // ---- submission ----

    /// Validate, upload and start a job, then begin polling it.
    ///
    /// The upload finishes before the job start is requested. On any
    /// failure the session returns to Idle and the user is told why. A
    /// submission overtaken by a reset leaves the view alone and returns
    /// [`ControllerError::Superseded`].
    pub async fn submit_job(
        &self,
        file: Option<UploadFile>,
        workers: Workers,
    ) -> Result<ProcessId, ControllerError> {
        let inner = &self.inner;

        if let Err(e) = validate_spreadsheet(file.as_ref().map(|f| f.file_name.as_str())) {
            return Err(self.reject(e));
        }
        let Some(file) = file else {
            return Err(self.reject(CoreError::Validation(MSG_NO_FILE.to_string())));
        };

        let generation = {
            let mut session = inner.session();
            if inner.advance(&mut session, SessionEvent::Submit).is_err() {
                return Err(ControllerError::Busy);
            }
            session.results = None;
            session.generation += 1;
            session.generation
        };

        inner.view.set_file_label(&file.file_name);
        inner.view.set_loading(true);
        let started = self.upload_and_start(&file, workers).await;

        // A reset (and possibly a newer submission) owns the view once the
        // generation has moved on.
        let is_current = |session: &Session| {
            session.generation == generation && session.phase == SessionPhase::Uploading
        };

        let response = match started {
            Ok(response) => response,
            Err((stage, error)) => {
                let message = user_message(&error, stage.default_message());
                {
                    let mut session = inner.session();
                    if !is_current(&session) {
                        tracing::debug!(stage = %stage, error = %error, "Superseded submission failed");
                        return Err(ControllerError::Superseded);
                    }
                    inner.view.set_loading(false);
                    let _ = inner.advance(&mut session, SessionEvent::SubmitFailed);
                }
                tracing::warn!(stage = %stage, error = %error, "Job submission failed");
                inner.notifier.error(message.as_str());
                return Err(ControllerError::Submit { stage, message });
            }
        };

        let process_id = response.process_id;
        let current = {
            let mut session = inner.session();
            let current = is_current(&session);
            if current {
                inner.view.set_loading(false);
                self.begin_processing(&mut session, &process_id, response.total_accounts);
            }
            current
        };

        if !current {
            tracing::warn!(process_id = %process_id, "Session reset during submission, cancelling orphaned job");
            if let Err(e) = inner.api.cancel(&process_id).await {
                tracing::warn!(process_id = %process_id, error = %e, "Failed to cancel orphaned job");
            }
            return Err(ControllerError::Superseded);
        }

        tracing::info!(
            process_id = %process_id,
            workers = workers.get(),
            total_accounts = ?response.total_accounts,
            "Job started",
        );

        self.start_polling();
        Ok(process_id)
    }

    fn begin_processing(
        &self,
        session: &mut Session,
        process_id: &ProcessId,
        total_accounts: Option<u64>,
    ) {
        let inner = &self.inner;
        session.process_id = Some(process_id.clone());
        session.is_processing = true;
        session.active_tab = ResultKind::Success;
        if let Err(e) = inner.advance(session, SessionEvent::Started) {
            tracing::warn!(error = %e, "Unexpected transition on job start");
        }

        inner.view.set_cancel_control(CancelControl::Cancel);
        inner.view.hide_results();
        inner.view.show_tab(ResultKind::Success);
        inner.view.update_progress(&ProgressView {
            total: total_accounts,
            processing: total_accounts.unwrap_or(0),
            ..Default::default()
        });
        inner.view.set_spinner(true);
        inner.view.show_panel(Panel::Progress);
    }

    fn reject(&self, error: CoreError) -> ControllerError {
        let message = match error {
            CoreError::Validation(message) => message,
            other => other.to_string(),
        };
        self.inner.notifier.error(message.as_str());
        ControllerError::Validation(message)
    }

    async fn upload_and_start(
        &self,
        file: &UploadFile,
        workers: Workers,
    ) -> Result<StartJobResponse, (SubmitStage, BatchApiError)> {
        let api = &self.inner.api;

        let uploaded = api
            .upload(file)
            .await
            .map_err(|e| (SubmitStage::Upload, e))?;
        tracing::debug!(file_path = %uploaded.file_path, "Spreadsheet uploaded");

        let request = StartJobRequest {
            file_path: uploaded.file_path,
            workers,
        };
        api.start_job(&request)
            .await
            .map_err(|e| (SubmitStage::Start, e))
    }

    // ---- polling ----

    /// (Re)start the poll loop for the active job.
    ///
    /// Any loop already registered is stopped first, so at most one runs.
    /// Returns `false` when there is no active job to poll.
    pub fn start_polling(&self) -> bool {
        let mut session = self.inner.session();
        session.stop_polling();

        let Some(process_id) = session.active_job().cloned() else {
            return false;
        };

        let handle = spawn_poll_loop(
            Arc::clone(&self.inner.api),
            Arc::clone(&self.inner),
            process_id,
            self.inner.config.poll_interval.max(MIN_POLL_INTERVAL),
            Arc::clone(&self.inner.live_polls),
        );
        session.poller = Some(handle);
        true
    }

    // ---- cancellation / reset ----

    /// Ask the backend to cancel the running job.
    ///
    /// Only an acknowledged cancellation touches local state. When the
    /// request fails the job is assumed to be still running and polling
    /// carries on.
    pub async fn cancel(&self) -> Result<(), ControllerError> {
        let inner = &self.inner;
        let active = inner.session().active_job().cloned();
        let Some(process_id) = active else {
            return Err(ControllerError::NoActiveJob);
        };

        tracing::info!(process_id = %process_id, "Cancelling job");

        if let Err(e) = inner.api.cancel(&process_id).await {
            let message = user_message(&e, MSG_CANCEL_FAILED);
            tracing::warn!(process_id = %process_id, error = %e, "Cancellation failed");
            inner.notifier.error(message.as_str());
            return Err(ControllerError::Cancel(message));
        }

        let mut session = inner.session();
        if !session.is_live(&process_id) {
            // Completed or reset while the request was in flight.
            return Ok(());
        }

        session.clear();
        if let Err(e) = inner.advance(&mut session, SessionEvent::Cancelled) {
            tracing::warn!(process_id = %process_id, error = %e, "Unexpected transition on cancel");
        }
        inner.show_fresh_upload();
        drop(session);

        tracing::info!(process_id = %process_id, "Job cancelled");
        inner.notifier.info(MSG_CANCELLED);
        Ok(())
    }

    /// Start a new session: forget the job and show the upload panel.
    ///
    /// Purely local and idempotent.
    pub fn reset(&self) {
        let mut session = self.inner.session();
        session.clear();
        if let Err(e) = self.inner.advance(&mut session, SessionEvent::Reset) {
            tracing::warn!(error = %e, "Unexpected transition on reset");
        }
        self.inner.show_fresh_upload();
    }

    // ---- results ----

    /// Switch between the success and failure panels. No refetch.
    pub fn show_tab(&self, tab: ResultKind) {
        let mut session = self.inner.session();
        session.active_tab = tab;
        self.inner.view.show_tab(tab);
    }

    pub fn download_enabled(&self, kind: ResultKind) -> bool {
        self.inner
            .session()
            .results
            .as_ref()
            .is_some_and(|r| r.download_enabled(kind))
    }

    /// Address of the download endpoint, when that category has rows.
    pub fn download_url(&self, kind: ResultKind) -> Option<String> {
        self.download_enabled(kind)
            .then(|| self.inner.api.download_url(kind))
    }

    /// Fetch the results file for `kind` from the backend.
    pub async fn download(&self, kind: ResultKind) -> Result<DownloadedFile, ControllerError> {
        if !self.download_enabled(kind) {
            return Err(ControllerError::DownloadUnavailable(kind));
        }

        match self.inner.api.download(kind).await {
            Ok(file) => {
                tracing::info!(kind = %kind, file_name = %file.file_name, bytes = file.bytes.len(), "Results downloaded");
                Ok(file)
            }
            Err(e) => {
                let message = user_message(&e, MSG_DOWNLOAD_FAILED);
                tracing::warn!(kind = %kind, error = %e, "Download failed");
                self.inner.notifier.error(message.as_str());
                Err(ControllerError::Download { kind, message })
            }
        }
    }

    // ---- theme ----

    /// Load the saved theme and apply it.
    pub fn init_theme(&self) -> Theme {
        let theme = self
            .inner
            .preferences
            .as_ref()
            .map(PreferenceStore::load_theme)
            .unwrap_or_default();
        *self.inner.theme.lock().unwrap_or_else(PoisonError::into_inner) = theme;
        self.inner.view.apply_theme(theme);
        theme
    }

    /// Flip between light and dark, apply and persist the result.
    pub fn toggle_theme(&self) -> Result<Theme, ControllerError> {
        let theme = {
            let mut current = self.inner.theme.lock().unwrap_or_else(PoisonError::into_inner);
            *current = current.toggled();
            *current
        };
        self.inner.view.apply_theme(theme);
        if let Some(store) = &self.inner.preferences {
            store.save_theme(theme)?;
        }
        Ok(theme)
    }

    pub fn theme(&self) -> Theme {
        *self.inner.theme.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
