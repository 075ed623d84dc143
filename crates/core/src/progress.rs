//! Progress snapshots reported by the backend and the counters derived
//! from them.

use serde::{Deserialize, Serialize};

use crate::records::{null_as_default, FailRecord, SuccessRecord};

/// Status of a job as returned by `GET /api/progress/{id}`.
///
/// Each poll returns a complete snapshot that replaces the previous one.
/// Absent counters read as zero and absent lists as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressSnapshot {
    /// Completion percentage (0-100), possibly fractional.
    #[serde(deserialize_with = "null_as_default")]
    pub progress: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_accounts: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub success_accounts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub failed_accounts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub processing_accounts: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_complete: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub success_data: Vec<SuccessRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub fail_data: Vec<FailRecord>,
}

/// Live counters shown while a job is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressView {
    /// Rounded percentage, clamped to 0-100. Drives the bar width.
    pub percent: u8,
    pub success: u64,
    pub failed: u64,
    pub processing: u64,
    pub total: Option<u64>,
}

impl ProgressView {
    /// Text shown next to the bar, e.g. `"42%"`.
    pub fn percent_label(&self) -> String {
        format!("{}%", self.percent)
    }
}

impl From<&ProgressSnapshot> for ProgressView {
    fn from(snapshot: &ProgressSnapshot) -> Self {
        Self {
            percent: round_percent(snapshot.progress),
            success: snapshot.success_accounts,
            failed: snapshot.failed_accounts,
            processing: snapshot.processing_accounts,
            total: snapshot.total_accounts,
        }
    }
}

/// Round a backend percentage to a whole number within 0-100.
///
/// Non-finite values read as 0.
pub fn round_percent(progress: f64) -> u8 {
    if !progress.is_finite() {
        return 0;
    }
    progress.round().clamp(0.0, 100.0) as u8
}
