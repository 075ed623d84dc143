//! Result files served by the download endpoint.

use acctbatch_core::types::ResultKind;

/// A results spreadsheet fetched from the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub kind: ResultKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("kind", &self.kind)
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl DownloadedFile {
    /// Name the file from the `Content-Disposition` header, falling back
    /// to `{kind}_results_<timestamp>.xlsx`.
    pub fn new(kind: ResultKind, content_disposition: Option<&str>, bytes: Vec<u8>) -> Self {
        let file_name = content_disposition
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| fallback_file_name(kind));
        Self {
            kind,
            file_name,
            bytes,
        }
    }
}

/// Extract a safe file name from a `Content-Disposition` header value.
///
/// Only the final path component is kept so a hostile header cannot
/// point outside the download directory.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let raw = header
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("filename="))?;
    let name = raw.trim().trim_matches('"');
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();

    (!name.is_empty() && name != "." && name != "..").then(|| name.to_string())
}

fn fallback_file_name(kind: ResultKind) -> String {
    format!(
        "{}_results_{}.xlsx",
        kind.as_str(),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}
