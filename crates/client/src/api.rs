//! REST API client for the batch backend.
//!
//! Wraps the five backend endpoints (upload, process, progress, cancel,
//! download) behind the [`BatchApi`] trait, with [`HttpBatchApi`] as the
//! [`reqwest`]-backed implementation.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Url;

use acctbatch_core::progress::ProgressSnapshot;
use acctbatch_core::records::{StartJobRequest, StartJobResponse, UploadResponse};
use acctbatch_core::types::{ProcessId, ResultKind, UploadFile};
use acctbatch_core::upload::file_extension;

use crate::download::DownloadedFile;

/// Multipart field name the upload endpoint reads the file from.
pub const UPLOAD_FIELD: &str = "file";

const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MIME_XLS: &str = "application/vnd.ms-excel";

/// Errors from the backend API layer.
#[derive(Debug, thiserror::Error)]
pub enum BatchApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decode, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Backend API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body, surfaced to the user when non-empty.
        body: String,
    },

    /// The configured base URL cannot carry a path.
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl BatchApiError {
    /// The backend's own error text, if it sent any.
    pub fn response_text(&self) -> Option<&str> {
        match self {
            Self::ApiError { body, .. } => Some(body.trim()).filter(|b| !b.is_empty()),
            _ => None,
        }
    }
}

/// Operations the controller needs from the backend.
#[async_trait]
pub trait BatchApi: Send + Sync {
    /// `POST /api/upload` with the file as multipart field `file`.
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, BatchApiError>;

    /// `POST /api/process` to start a job on an uploaded file.
    async fn start_job(&self, request: &StartJobRequest)
        -> Result<StartJobResponse, BatchApiError>;

    /// `GET /api/progress/{id}`.
    async fn progress(&self, process_id: &ProcessId) -> Result<ProgressSnapshot, BatchApiError>;

    /// `POST /api/cancel/{id}`.
    async fn cancel(&self, process_id: &ProcessId) -> Result<(), BatchApiError>;

    /// `GET /api/download/{type}`; the backend produces the file.
    async fn download(&self, kind: ResultKind) -> Result<DownloadedFile, BatchApiError>;

    /// Address of the download endpoint for `kind`.
    fn download_url(&self, kind: ResultKind) -> String;
}

/// HTTP client for one backend instance.
#[derive(Debug)]
pub struct HttpBatchApi {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBatchApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Backend root, e.g. `http://localhost:8080`.
    pub fn new(base_url: &str) -> Result<Self, BatchApiError> {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (e.g. one built with a request timeout).
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Result<Self, BatchApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BatchApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BatchApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ---- private helpers ----

    /// Build `{base}/api/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BatchApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| BatchApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`BatchApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, BatchApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BatchApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BatchApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

fn upload_part(file: &UploadFile) -> Result<Part, BatchApiError> {
    let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
    let part = match file_extension(&file.file_name).as_deref() {
        Some("xlsx") => part.mime_str(MIME_XLSX)?,
        Some("xls") => part.mime_str(MIME_XLS)?,
        _ => part,
    };
    Ok(part)
}

#[async_trait]
impl BatchApi for HttpBatchApi {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, BatchApiError> {
        let form = Form::new().part(UPLOAD_FIELD, upload_part(file)?);

        tracing::debug!(file_name = %file.file_name, bytes = file.bytes.len(), "Uploading spreadsheet");

        let response = self
            .client
            .post(self.endpoint(&["upload"])?)
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn start_job(
        &self,
        request: &StartJobRequest,
    ) -> Result<StartJobResponse, BatchApiError> {
        let response = self
            .client
            .post(self.endpoint(&["process"])?)
            .json(request)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn progress(&self, process_id: &ProcessId) -> Result<ProgressSnapshot, BatchApiError> {
        let response = self
            .client
            .get(self.endpoint(&["progress", process_id.as_str()])?)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    async fn cancel(&self, process_id: &ProcessId) -> Result<(), BatchApiError> {
        let response = self
            .client
            .post(self.endpoint(&["cancel", process_id.as_str()])?)
            .send()
            .await?;

        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn download(&self, kind: ResultKind) -> Result<DownloadedFile, BatchApiError> {
        let response = self
            .client
            .get(self.endpoint(&["download", kind.as_str()])?)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let bytes = response.bytes().await?;

        Ok(DownloadedFile::new(kind, disposition.as_deref(), bytes.to_vec()))
    }

    fn download_url(&self, kind: ResultKind) -> String {
        self.endpoint(&["download", kind.as_str()])
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}api/download/{}", self.base_url, kind.as_str()))
    }
}
