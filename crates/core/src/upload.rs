//! Local validation of the spreadsheet chosen for upload.
//!
//! Runs before any network call, so a rejected file never leaves the
//! machine.

use crate::error::CoreError;

/// Spreadsheet extensions the backend accepts.
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xls"];

/// File label shown while nothing is selected.
pub const NO_FILE_LABEL: &str = "Choose an Excel file";

pub const MSG_NO_FILE: &str = "Please choose an Excel file";
pub const MSG_WRONG_EXTENSION: &str = "Only Excel files (.xlsx or .xls) are supported";

/// Lower-cased text after the last dot, or `None` if there is no dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Check that a file was chosen and that it looks like a spreadsheet.
///
/// A name without a dot has no extension, so a bare `xlsx` is rejected.
pub fn validate_spreadsheet(file_name: Option<&str>) -> Result<(), CoreError> {
    let Some(name) = file_name.filter(|n| !n.trim().is_empty()) else {
        return Err(CoreError::Validation(MSG_NO_FILE.to_string()));
    };

    match file_extension(name) {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(CoreError::Validation(MSG_WRONG_EXTENSION.to_string())),
    }
}
