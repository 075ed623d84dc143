//! Results tables built from a completed progress snapshot.
//!
//! Each category becomes a [`ResultTable`]: the formatted rows, whether
//! the table or its "no records" placeholder is visible, and whether the
//! category can be downloaded.

use crate::format::format_number;
use crate::progress::ProgressSnapshot;
use crate::records::{FailRecord, SuccessRecord};
use crate::types::ResultKind;

/// Placeholder text shown in place of an empty table.
pub const NO_RECORDS_MESSAGE: &str = "No records";

/// Column headings of the success table.
pub const SUCCESS_COLUMNS: [&str; 5] = ["#", "Username", "Balance", "Last deposit", "Deposit time"];

/// Column headings of the failure table.
pub const FAIL_COLUMNS: [&str; 4] = ["#", "Username", "Password", "Reason"];

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One rendered table row. `index` is 1-based display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub index: usize,
    pub cells: Vec<String>,
}

impl TableRow {
    /// Row number followed by the data cells.
    pub fn columns(&self) -> Vec<String> {
        std::iter::once(self.index.to_string())
            .chain(self.cells.iter().cloned())
            .collect()
    }
}

fn success_cells(record: &SuccessRecord) -> Vec<String> {
    vec![
        record.username.clone(),
        format_number(record.balance),
        format_number(record.last_deposit),
        record.deposit_time.clone(),
    ]
}

fn fail_cells(record: &FailRecord) -> Vec<String> {
    vec![
        record.username.clone(),
        record.password.clone(),
        record.reason.clone(),
    ]
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// What a results panel displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableVisibility {
    /// The table is shown and the placeholder hidden.
    Table,
    /// The table is hidden and the "no records" placeholder shown.
    Placeholder,
}

/// A fully rendered results table for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    pub kind: ResultKind,
    pub columns: &'static [&'static str],
    pub rows: Vec<TableRow>,
}

impl ResultTable {
    fn build<T>(kind: ResultKind, records: &[T], cells: fn(&T) -> Vec<String>) -> Self {
        let columns: &'static [&'static str] = match kind {
            ResultKind::Success => &SUCCESS_COLUMNS,
            ResultKind::Fail => &FAIL_COLUMNS,
        };
        let rows = records
            .iter()
            .enumerate()
            .map(|(i, record)| TableRow {
                index: i + 1,
                cells: cells(record),
            })
            .collect();
        Self {
            kind,
            columns,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn visibility(&self) -> TableVisibility {
        if self.is_empty() {
            TableVisibility::Placeholder
        } else {
            TableVisibility::Table
        }
    }

    /// Downloads are offered only for categories with at least one row.
    pub fn download_enabled(&self) -> bool {
        !self.is_empty()
    }
}

/// Both results tables for a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub success: ResultTable,
    pub fail: ResultTable,
}

impl ResultsView {
    pub fn from_snapshot(snapshot: &ProgressSnapshot) -> Self {
        Self {
            success: ResultTable::build(ResultKind::Success, &snapshot.success_data, success_cells),
            fail: ResultTable::build(ResultKind::Fail, &snapshot.fail_data, fail_cells),
        }
    }

    pub fn table(&self, kind: ResultKind) -> &ResultTable {
        match kind {
            ResultKind::Success => &self.success,
            ResultKind::Fail => &self.fail,
        }
    }

    pub fn download_enabled(&self, kind: ResultKind) -> bool {
        self.table(kind).download_enabled()
    }
}
