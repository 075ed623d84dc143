//! `acctbatch` -- submit account spreadsheets and follow their progress.
//!
//! # Environment variables
//!
//! | Variable               | Default                 | Description                         |
//! |------------------------|-------------------------|-------------------------------------|
//! | `API_BASE_URL`         | `http://localhost:8080` | Backend origin                      |
//! | `POLL_INTERVAL_MS`     | `2000`                  | Time between progress checks        |
//! | `REQUEST_TIMEOUT_SECS` | unset                   | Per-request timeout                 |
//! | `STATE_DIR`            | `.acctbatch`            | Where the theme preference is kept  |
//! | `DOWNLOAD_DIR`         | `.`                     | Where `--download` writes files     |
//! | `LOG_FORMAT`           | `text`                  | `text` or `json` logs on stderr     |
//! | `RUST_LOG`             | `acctbatch=info,...`    | Log filter                          |

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use acctbatch_console::cli::{Cli, Commands, ThemeAction};
use acctbatch_console::config::{ConsoleConfig, LogFormat};
use acctbatch_console::runner::{self, ConsoleError};
use acctbatch_console::terminal::TerminalView;
use acctbatch_core::session::SessionPhase;
use acctbatch_core::types::{ResultKind, Workers};

const DEFAULT_LOG_FILTER: &str =
    "acctbatch=info,acctbatch_console=info,acctbatch_controller=info,acctbatch_client=info";

/// Exit status after a job was cancelled, as for an interrupted command.
const EXIT_CANCELLED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = match ConsoleConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("acctbatch: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.log_format);

    match execute(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("acctbatch: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let json = format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with((!json).then(|| fmt::layer().with_writer(std::io::stderr)))
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .init();
}

async fn execute(command: Commands, config: &ConsoleConfig) -> Result<ExitCode, ConsoleError> {
    let view = Arc::new(TerminalView::stdout());
    let controller = runner::build_controller(config, view)?;

    match command {
        Commands::Run {
            file,
            workers,
            download,
        } => {
            let workers = Workers::parse_or_default(&workers);
            let upload = runner::read_spreadsheet(&file).await?;

            tracing::info!(
                file = %file.display(),
                workers = workers.get(),
                base_url = %config.api_base_url,
                "Submitting spreadsheet",
            );

            let interrupt = || async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "Cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };

            match runner::run_job(&controller, upload, workers, interrupt).await? {
                SessionPhase::Complete => {
                    // The success table was printed on completion.
                    controller.show_tab(ResultKind::Fail);
                    if download {
                        for path in runner::save_results(&controller, &config.download_dir).await? {
                            println!("Saved {}", path.display());
                        }
                    }
                    Ok(ExitCode::SUCCESS)
                }
                phase => {
                    tracing::info!(?phase, "Job did not complete");
                    Ok(ExitCode::from(EXIT_CANCELLED))
                }
            }
        }
        Commands::Theme { action } => {
            controller.init_theme();
            if action == Some(ThemeAction::Toggle) {
                controller.toggle_theme()?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
