//! Shared fixtures for controller integration tests.
//!
//! [`FakeApi`] is a scripted in-memory backend: progress answers are
//! popped from a queue, each endpoint can be told to fail, and every call
//! is counted.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use acctbatch_client::{BatchApi, BatchApiError, DownloadedFile};
use acctbatch_controller::{ControllerConfig, StateView, UploadController};
use acctbatch_core::progress::ProgressSnapshot;
use acctbatch_core::records::{
    FailRecord, StartJobRequest, StartJobResponse, SuccessRecord, UploadResponse,
};
use acctbatch_core::types::{ProcessId, ResultKind, UploadFile};

pub const POLL: Duration = Duration::from_secs(2);

/// A `(status, body)` pair turned into an `ApiError` on every call.
type Failure = Option<(u16, String)>;

fn fail_with(failure: &Mutex<Failure>) -> Result<(), BatchApiError> {
    match failure.lock().unwrap().clone() {
        Some((status, body)) => Err(BatchApiError::ApiError { status, body }),
        None => Ok(()),
    }
}

#[derive(Default)]
pub struct FakeApi {
    pub process_id: Mutex<String>,
    pub total_accounts: Mutex<Option<u64>>,
    /// Stored path reported by upload; defaults to `/uploads/<name>`.
    pub upload_path: Mutex<Option<String>>,

    pub upload_failure: Mutex<Failure>,
    pub start_failure: Mutex<Failure>,
    pub cancel_failure: Mutex<Failure>,
    pub download_failure: Mutex<Failure>,

    /// Answers for successive progress calls. When empty, a running
    /// snapshot at 0% is returned.
    pub progress_script: Mutex<VecDeque<Result<ProgressSnapshot, (u16, String)>>>,
    pub progress_delay: Mutex<Option<Duration>>,
    pub start_delay: Mutex<Option<Duration>>,

    pub uploads: AtomicUsize,
    pub starts: AtomicUsize,
    pub polls: AtomicUsize,
    pub cancels: AtomicUsize,
    pub downloads: AtomicUsize,

    pub last_upload: Mutex<Option<String>>,
    pub last_start: Mutex<Option<StartJobRequest>>,
    pub cancelled_ids: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        let api = Self::default();
        *api.process_id.lock().unwrap() = "process_1".to_string();
        *api.total_accounts.lock().unwrap() = Some(3);
        api
    }

    pub fn script(&self, answers: impl IntoIterator<Item = ProgressSnapshot>) {
        self.progress_script
            .lock()
            .unwrap()
            .extend(answers.into_iter().map(Ok));
    }

    pub fn script_error(&self, status: u16, body: &str) {
        self.progress_script
            .lock()
            .unwrap()
            .push_back(Err((status, body.to_string())));
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchApi for FakeApi {
    async fn upload(&self, file: &UploadFile) -> Result<UploadResponse, BatchApiError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        *self.last_upload.lock().unwrap() = Some(file.file_name.clone());
        fail_with(&self.upload_failure)?;
        let file_path = self
            .upload_path
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| format!("/uploads/{}", file.file_name));
        Ok(UploadResponse { file_path })
    }

    async fn start_job(
        &self,
        request: &StartJobRequest,
    ) -> Result<StartJobResponse, BatchApiError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        *self.last_start.lock().unwrap() = Some(request.clone());
        let delay = *self.start_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        fail_with(&self.start_failure)?;
        Ok(StartJobResponse {
            process_id: ProcessId::new(self.process_id.lock().unwrap().clone()),
            total_accounts: *self.total_accounts.lock().unwrap(),
        })
    }

    async fn progress(&self, _process_id: &ProcessId) -> Result<ProgressSnapshot, BatchApiError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.progress_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let answer = self.progress_script.lock().unwrap().pop_front();
        match answer {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err((status, body))) => Err(BatchApiError::ApiError { status, body }),
            None => Ok(running(0.0, 0, 0, 3)),
        }
    }

    async fn cancel(&self, process_id: &ProcessId) -> Result<(), BatchApiError> {
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled_ids
            .lock()
            .unwrap()
            .push(process_id.as_str().to_string());
        fail_with(&self.cancel_failure)
    }

    async fn download(&self, kind: ResultKind) -> Result<DownloadedFile, BatchApiError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        fail_with(&self.download_failure)?;
        Ok(DownloadedFile::new(
            kind,
            Some(&format!("attachment; filename={kind}_results.xlsx")),
            b"PK\x03\x04".to_vec(),
        ))
    }

    fn download_url(&self, kind: ResultKind) -> String {
        format!("http://backend.test/api/download/{kind}")
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

pub fn running(progress: f64, success: u64, failed: u64, processing: u64) -> ProgressSnapshot {
    ProgressSnapshot {
        progress,
        total_accounts: Some(success + failed + processing),
        success_accounts: success,
        failed_accounts: failed,
        processing_accounts: processing,
        ..Default::default()
    }
}

pub fn complete(success: Vec<SuccessRecord>, fail: Vec<FailRecord>) -> ProgressSnapshot {
    ProgressSnapshot {
        progress: 100.0,
        total_accounts: Some((success.len() + fail.len()) as u64),
        success_accounts: success.len() as u64,
        failed_accounts: fail.len() as u64,
        processing_accounts: 0,
        is_complete: true,
        success_data: success,
        fail_data: fail,
    }
}

pub fn success_record(username: &str, balance: f64) -> SuccessRecord {
    SuccessRecord {
        username: username.to_string(),
        balance,
        ..Default::default()
    }
}

pub fn fail_record(username: &str, reason: &str) -> FailRecord {
    FailRecord {
        username: username.to_string(),
        password: "pw".to_string(),
        reason: reason.to_string(),
    }
}

pub fn spreadsheet(name: &str) -> UploadFile {
    UploadFile::new(name, b"PK\x03\x04sheet".to_vec())
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub controller: UploadController,
    pub api: Arc<FakeApi>,
    pub view: Arc<StateView>,
}

pub fn harness(api: FakeApi) -> Harness {
    let api = Arc::new(api);
    let view = Arc::new(StateView::new());
    let controller = UploadController::new(api.clone(), view.clone(), ControllerConfig::default());
    Harness {
        controller,
        api,
        view,
    }
}

/// Let spawned tasks run without moving the clock past the next tick.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
