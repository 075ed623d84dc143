//! Rendering seam between the controller and a front end.
//!
//! The controller never draws anything itself; it tells a [`View`] what
//! changed. [`StateView`] is a headless implementation that keeps the
//! latest rendered state for inspection.

use std::sync::{Mutex, MutexGuard, PoisonError};

use acctbatch_core::notification::{Notification, NotificationStage};
use acctbatch_core::progress::ProgressView;
use acctbatch_core::results::ResultsView;
use acctbatch_core::theme::Theme;
use acctbatch_core::types::ResultKind;
use acctbatch_core::upload::NO_FILE_LABEL;

/// Top-level panel on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    /// File picker and worker count.
    #[default]
    Upload,
    /// Progress bar, counters and (once complete) results.
    Progress,
}

/// Role of the button under the progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancelControl {
    /// Cancels the running job.
    #[default]
    Cancel,
    /// Starts a fresh session after completion.
    NewSession,
}

impl CancelControl {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cancel => "Cancel processing",
            Self::NewSession => "New session",
        }
    }
}

/// Everything the controller can change on screen.
///
/// Calls arrive while the controller holds its session lock, so an
/// implementation must not call back into the controller synchronously.
pub trait View: Send + Sync {
    fn show_panel(&self, panel: Panel);

    /// Blocking "loading" indicator shown while a job is being submitted.
    fn set_loading(&self, loading: bool);

    /// Spinner next to the progress bar while the job runs.
    fn set_spinner(&self, visible: bool);

    fn set_file_label(&self, label: &str);

    fn update_progress(&self, progress: &ProgressView);

    fn show_results(&self, results: &ResultsView);

    fn hide_results(&self);

    fn show_tab(&self, tab: ResultKind);

    fn set_cancel_control(&self, control: CancelControl);

    fn notify(&self, notification: &Notification);

    fn set_notification_stage(&self, id: u64, stage: NotificationStage);

    fn apply_theme(&self, theme: Theme);
}

// ---------------------------------------------------------------------------
// Headless view
// ---------------------------------------------------------------------------

/// Snapshot of what a [`StateView`] currently displays.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub panel: Panel,
    pub loading: bool,
    pub spinner: bool,
    pub file_label: String,
    pub progress: ProgressView,
    pub results: Option<ResultsView>,
    pub active_tab: ResultKind,
    pub cancel_control: CancelControl,
    /// Notifications still on screen, with their stage.
    pub notifications: Vec<(Notification, NotificationStage)>,
    pub theme: Theme,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            panel: Panel::Upload,
            loading: false,
            spinner: false,
            file_label: NO_FILE_LABEL.to_string(),
            progress: ProgressView::default(),
            results: None,
            active_tab: ResultKind::Success,
            cancel_control: CancelControl::Cancel,
            notifications: Vec::new(),
            theme: Theme::Light,
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    state: ViewState,
    panel_history: Vec<Panel>,
    notification_log: Vec<Notification>,
    results_rendered: usize,
}

/// In-memory [`View`] that records the current screen state.
#[derive(Debug, Default)]
pub struct StateView {
    inner: Mutex<Recorded>,
}

impl StateView {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current screen state.
    pub fn state(&self) -> ViewState {
        self.lock().state.clone()
    }

    /// Every panel switch, in order.
    pub fn panel_history(&self) -> Vec<Panel> {
        self.lock().panel_history.clone()
    }

    /// Every notification ever shown, including removed ones.
    pub fn notification_log(&self) -> Vec<Notification> {
        self.lock().notification_log.clone()
    }

    /// How many times a results view has been rendered.
    pub fn results_rendered(&self) -> usize {
        self.lock().results_rendered
    }
}

impl View for StateView {
    fn show_panel(&self, panel: Panel) {
        let mut rec = self.lock();
        rec.state.panel = panel;
        rec.panel_history.push(panel);
    }

    fn set_loading(&self, loading: bool) {
        self.lock().state.loading = loading;
    }

    fn set_spinner(&self, visible: bool) {
        self.lock().state.spinner = visible;
    }

    fn set_file_label(&self, label: &str) {
        self.lock().state.file_label = label.to_string();
    }

    fn update_progress(&self, progress: &ProgressView) {
        self.lock().state.progress = *progress;
    }

    fn show_results(&self, results: &ResultsView) {
        let mut rec = self.lock();
        rec.state.results = Some(results.clone());
        rec.results_rendered += 1;
    }

    fn hide_results(&self) {
        self.lock().state.results = None;
    }

    fn show_tab(&self, tab: ResultKind) {
        self.lock().state.active_tab = tab;
    }

    fn set_cancel_control(&self, control: CancelControl) {
        self.lock().state.cancel_control = control;
    }

    fn notify(&self, notification: &Notification) {
        let mut rec = self.lock();
        rec.state
            .notifications
            .push((notification.clone(), NotificationStage::Shown));
        rec.notification_log.push(notification.clone());
    }

    fn set_notification_stage(&self, id: u64, stage: NotificationStage) {
        let mut rec = self.lock();
        if stage == NotificationStage::Removed {
            rec.state.notifications.retain(|(n, _)| n.id != id);
        } else if let Some(entry) = rec.state.notifications.iter_mut().find(|(n, _)| n.id == id) {
            entry.1 = stage;
        }
    }

    fn apply_theme(&self, theme: Theme) {
        self.lock().state.theme = theme;
    }
}
