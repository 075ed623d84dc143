//! Persisted client preferences.
//!
//! Preferences live in a small JSON object on disk, keyed the same way
//! a browser would key local storage. Only the theme is stored today;
//! unknown keys are preserved on write.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use acctbatch_core::theme::{Theme, THEME_KEY};

/// File name of the preference store inside the state directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("Preference file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

type Entries = BTreeMap<String, serde_json::Value>;

/// File-backed preference store.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store preferences in `dir/preferences.json`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(PREFERENCES_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved theme, or `Light` when nothing usable is stored.
    pub fn load_theme(&self) -> Theme {
        match self.read_entries() {
            Ok(entries) => entries
                .get(THEME_KEY)
                .and_then(|v| v.as_str())
                .map(Theme::parse_or_default)
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable preferences");
                Theme::default()
            }
        }
    }

    pub fn save_theme(&self, theme: Theme) -> Result<(), PreferenceError> {
        // A corrupt file is replaced rather than blocking the write.
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(THEME_KEY.to_string(), serde_json::Value::from(theme.as_str()));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&entries)?)?;

        tracing::debug!(path = %self.path.display(), theme = theme.as_str(), "Theme preference saved");
        Ok(())
    }

    fn read_entries(&self) -> Result<Entries, PreferenceError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }
}
