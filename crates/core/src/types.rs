//! Identifier and parameter types shared across the workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ProcessId
// ---------------------------------------------------------------------------

/// Backend-assigned identifier of one batch job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(String);

impl ProcessId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProcessId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// ---------------------------------------------------------------------------
// ResultKind
// ---------------------------------------------------------------------------

/// Which of the two result categories a table or download refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    #[default]
    Success,
    Fail,
}

impl ResultKind {
    /// Path segment used by the download endpoint.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Fail => "fail",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "Successful accounts",
            Self::Fail => "Failed accounts",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

/// Worker count the backend falls back to when the requested value is
/// not a positive integer.
pub const DEFAULT_WORKERS: u32 = 2;

/// Number of parallel workers requested for a job.
///
/// Always positive. Serialized as a string because the process endpoint
/// decodes `workers` as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workers(u32);

impl Workers {
    /// Returns `None` for zero.
    pub fn new(count: u32) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }

    /// Parse user input, falling back to [`DEFAULT_WORKERS`] for anything
    /// that is not a positive integer.
    pub fn parse_or_default(input: &str) -> Self {
        input
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .unwrap_or_default()
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Workers {
    fn default() -> Self {
        Self(DEFAULT_WORKERS)
    }
}

impl fmt::Display for Workers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Workers {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// UploadFile
// ---------------------------------------------------------------------------

/// A spreadsheet selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}
