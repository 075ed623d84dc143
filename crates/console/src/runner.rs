//! Command implementations behind the `acctbatch` binary.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use acctbatch_client::{BatchApiError, HttpBatchApi};
use acctbatch_controller::{ControllerError, PreferenceStore, UploadController, View};
use acctbatch_core::session::SessionPhase;
use acctbatch_core::types::{ResultKind, UploadFile, Workers};

use crate::config::{ConfigError, ConsoleConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Client(#[from] BatchApiError),

    #[error(transparent)]
    Controller(#[from] ControllerError),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Controller wired to the configured backend and preference store.
pub fn build_controller(
    config: &ConsoleConfig,
    view: Arc<dyn View>,
) -> Result<UploadController, ConsoleError> {
    let api = HttpBatchApi::with_client(config.http_client()?, &config.api_base_url)?;
    tracing::debug!(base_url = %api.base_url(), "Backend configured");

    Ok(
        UploadController::new(Arc::new(api), view, config.controller_config())
            .with_preferences(PreferenceStore::in_dir(&config.state_dir)),
    )
}

/// Read a spreadsheet from disk for upload.
pub async fn read_spreadsheet(path: &Path) -> Result<UploadFile, ConsoleError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| ConsoleError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(UploadFile::new(file_name, bytes))
}

/// Submit `file` and wait until the job completes or is cancelled.
///
/// Each time `interrupt` resolves, cancellation is requested. A refused
/// cancellation leaves the job running and waiting resumes.
pub async fn run_job<F, Fut>(
    controller: &UploadController,
    file: UploadFile,
    workers: Workers,
    mut interrupt: F,
) -> Result<SessionPhase, ConsoleError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut phases = controller.subscribe_phase();

    controller.select_file(Some(&file.file_name));
    let process_id = controller.submit_job(Some(file), workers).await?;
    tracing::info!(process_id = %process_id, "Following job");

    loop {
        tokio::select! {
            finished = phases.wait_for(|phase| phase.is_terminal()) => {
                return Ok(match finished {
                    Ok(phase) => *phase,
                    Err(_) => controller.phase(),
                });
            }
            () = interrupt() => {
                tracing::info!(process_id = %process_id, "Interrupt received, cancelling job");
                match controller.cancel().await {
                    Ok(()) | Err(ControllerError::NoActiveJob) => {}
                    Err(e) => tracing::warn!(error = %e, "Job keeps running"),
                }
            }
        }
    }
}

/// Save every non-empty result category into `dir`.
pub async fn save_results(
    controller: &UploadController,
    dir: &Path,
) -> Result<Vec<PathBuf>, ConsoleError> {
    let mut saved = Vec::new();

    for kind in [ResultKind::Success, ResultKind::Fail] {
        if !controller.download_enabled(kind) {
            tracing::debug!(kind = %kind, "No rows, skipping download");
            continue;
        }

        let file = controller.download(kind).await?;
        let path = dir.join(&file.file_name);
        let save_err = |source: std::io::Error| ConsoleError::Save {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(dir).await.map_err(save_err)?;
        tokio::fs::write(&path, &file.bytes).await.map_err(save_err)?;

        tracing::info!(kind = %kind, path = %path.display(), bytes = file.bytes.len(), "Results saved");
        saved.push(path);
    }

    Ok(saved)
}
