//! Line-oriented terminal rendering of the controller's view.
//!
//! [`TerminalView`] prints each state change as it happens. Panels and
//! spinners have no terminal counterpart beyond a status line, and
//! notifications are printed once since lines cannot fade.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use acctbatch_controller::{CancelControl, Panel, View};
use acctbatch_core::notification::{Notification, NotificationStage};
use acctbatch_core::progress::ProgressView;
use acctbatch_core::results::{
    ResultTable, ResultsView, TableRow, TableVisibility, NO_RECORDS_MESSAGE,
};
use acctbatch_core::theme::Theme;
use acctbatch_core::types::ResultKind;

/// Number of cells in the progress bar.
pub const BAR_WIDTH: usize = 30;

/// One status line: bar, percentage and counters.
pub fn render_progress(progress: &ProgressView) -> String {
    let filled = usize::from(progress.percent.min(100)) * BAR_WIDTH / 100;
    let total = progress
        .total
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "[{}{}] {:>4}  success {}  failed {}  processing {}  total {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress.percent_label(),
        progress.success,
        progress.failed,
        progress.processing,
        total,
    )
}

/// A titled, column-aligned table, or the placeholder when empty.
pub fn render_table(table: &ResultTable) -> String {
    let mut out = format!("{} ({})\n", table.kind.label(), table.rows.len());
    if table.visibility() == TableVisibility::Placeholder {
        out.push_str(NO_RECORDS_MESSAGE);
        out.push('\n');
        return out;
    }

    let header: Vec<String> = table.columns.iter().map(|c| c.to_string()).collect();
    let rows: Vec<Vec<String>> = table.rows.iter().map(TableRow::columns).collect();

    let mut widths: Vec<usize> = header.iter().map(|c| c.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    for row in std::iter::once(&header).chain(&rows) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[derive(Default)]
struct Screen {
    file_label: String,
    last_progress: Option<ProgressView>,
    results: Option<ResultsView>,
}

pub struct TerminalView {
    out: Mutex<Box<dyn Write + Send>>,
    screen: Mutex<Screen>,
}

impl TerminalView {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            screen: Mutex::new(Screen::default()),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn print(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "Terminal write failed");
        }
    }
}

impl View for TerminalView {
    fn show_panel(&self, panel: Panel) {
        if panel == Panel::Upload {
            self.print("Ready for a new upload.");
        }
    }

    fn set_loading(&self, loading: bool) {
        if loading {
            let label = self.screen().file_label.clone();
            self.print(&format!("Uploading {label}..."));
        }
    }

    fn set_spinner(&self, _visible: bool) {}

    fn set_file_label(&self, label: &str) {
        self.screen().file_label = label.to_string();
    }

    fn update_progress(&self, progress: &ProgressView) {
        {
            let mut screen = self.screen();
            if screen.last_progress == Some(*progress) {
                return;
            }
            screen.last_progress = Some(*progress);
        }
        self.print(&render_progress(progress));
    }

    fn show_results(&self, results: &ResultsView) {
        self.screen().results = Some(results.clone());
    }

    fn hide_results(&self) {
        let mut screen = self.screen();
        screen.results = None;
        screen.last_progress = None;
    }

    fn show_tab(&self, tab: ResultKind) {
        let rendered = self
            .screen()
            .results
            .as_ref()
            .map(|results| render_table(results.table(tab)));
        if let Some(rendered) = rendered {
            self.print(&rendered);
        }
    }

    fn set_cancel_control(&self, control: CancelControl) {
        if control == CancelControl::NewSession {
            self.print("Job finished.");
        }
    }

    fn notify(&self, notification: &Notification) {
        self.print(&format!(
            "[{}] {}",
            notification.level.as_str(),
            notification.message
        ));
    }

    fn set_notification_stage(&self, id: u64, stage: NotificationStage) {
        tracing::trace!(id, ?stage, "Notification stage");
    }

    fn apply_theme(&self, theme: Theme) {
        self.print(&format!("Theme: {}", theme.as_str()));
    }
}
