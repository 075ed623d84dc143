//! Wire records exchanged with the batch backend.
//!
//! The backend omits empty fields and may send `null` for lists, so every
//! field here tolerates being absent or `null` and falls back to its
//! default.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{ProcessId, Workers};

/// Deserialize `null` as `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Account records
// ---------------------------------------------------------------------------

/// An account that the job processed successfully.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuccessRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub balance: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub last_deposit: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub deposit_time: String,
}

/// An account the job could not process, with the backend's reason.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FailRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Server-side storage path of the uploaded spreadsheet.
    pub file_path: String,
}

/// Body of `POST /api/process`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    pub file_path: String,
    pub workers: Workers,
}

/// Response of `POST /api/process`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobResponse {
    pub process_id: ProcessId,
    /// Number of accounts the backend counted in the uploaded file.
    #[serde(default)]
    pub total_accounts: Option<u64>,
}
