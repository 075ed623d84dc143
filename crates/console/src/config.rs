use std::path::PathBuf;
use std::time::Duration;

use acctbatch_controller::ControllerConfig;

/// Backend address used when `API_BASE_URL` is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Console configuration loaded from environment variables.
///
/// Every field has a default suitable for a backend on the local machine.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend origin; `/api/...` paths are appended to it.
    pub api_base_url: String,
    pub poll_interval: Duration,
    /// Per-request timeout. `None` waits as long as the backend takes.
    pub request_timeout: Option<Duration>,
    /// Where the preference file lives.
    pub state_dir: PathBuf,
    /// Where downloaded result files are written.
    pub download_dir: PathBuf,
    pub log_format: LogFormat,
}

impl ConsoleConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `API_BASE_URL`         | `http://localhost:8080` |
    /// | `POLL_INTERVAL_MS`     | `2000`                  |
    /// | `REQUEST_TIMEOUT_SECS` | unset (no timeout)      |
    /// | `STATE_DIR`            | `.acctbatch`            |
    /// | `DOWNLOAD_DIR`         | `.`                     |
    /// | `LOG_FORMAT`           | `text` (or `json`)      |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_base_url = var("API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());

        let poll_interval = match var("POLL_INTERVAL_MS") {
            Some(v) => Duration::from_millis(parse_u64("POLL_INTERVAL_MS", &v)?),
            None => Duration::from_secs(2),
        };

        let request_timeout = var("REQUEST_TIMEOUT_SECS")
            .map(|v| parse_u64("REQUEST_TIMEOUT_SECS", &v).map(Duration::from_secs))
            .transpose()?;

        let state_dir = var("STATE_DIR").unwrap_or_else(|| ".acctbatch".into()).into();
        let download_dir = var("DOWNLOAD_DIR").unwrap_or_else(|| ".".into()).into();

        let log_format = match var("LOG_FORMAT").as_deref().map(str::trim) {
            None => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: v.to_string(),
                })
            }
        };

        Ok(Self {
            api_base_url,
            poll_interval,
            request_timeout,
            state_dir,
            download_dir,
            log_format,
        })
    }

    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig::default().with_poll_interval(self.poll_interval)
    }

    /// HTTP client honoring the configured timeout.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ConsoleConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ConsoleConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8080");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert!(config.request_timeout.is_none());
        assert_eq!(config.state_dir, PathBuf::from(".acctbatch"));
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn reads_overrides() {
        let config = load(&[
            ("API_BASE_URL", "http://batch.internal:9000"),
            ("POLL_INTERVAL_MS", "500"),
            ("REQUEST_TIMEOUT_SECS", "30"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url, "http://batch.internal:9000");
        assert_eq!(config.poll_interval, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.controller_config().poll_interval, Duration::from_millis(500));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("POLL_INTERVAL_MS", " "), ("API_BASE_URL", "")]).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn rejects_bad_numbers() {
        assert_matches!(
            load(&[("POLL_INTERVAL_MS", "soon")]),
            Err(ConfigError::Invalid { name: "POLL_INTERVAL_MS", .. })
        );
        assert_matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })
        );
    }
}
