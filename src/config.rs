//! Settings for the widgets, loaded from TOML.
//!
//! Every field has a default, so an empty document (or a missing file) yields
//! the stock configuration: a 25 minute Pomodoro ticking once per second,
//! toasts that live for three seconds and a 300ms search debounce.
//!
//! ```toml
//! [pomodoro]
//! duration_secs = 1500
//!
//! [search]
//! mode = "fuzzy"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Countdown settings.
    pub pomodoro: PomodoroSettings,
    /// Toast lifetimes and width.
    pub toast: ToastSettings,
    /// Task search settings.
    pub search: SearchSettings,
    /// Theme persistence.
    pub theme: ThemeSettings,
}

/// Countdown settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PomodoroSettings {
    /// Length of one session in seconds.
    pub duration_secs: u64,
    /// Tick period in milliseconds.
    pub tick_millis: u64,
}

impl Default for PomodoroSettings {
    fn default() -> Self {
        Self {
            duration_secs: 25 * 60,
            tick_millis: 1000,
        }
    }
}

impl PomodoroSettings {
    /// The tick period.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

/// Toast timing and layout.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToastSettings {
    /// How long a toast stays visible.
    pub lifetime_millis: u64,
    /// Delay before a new toast is shown.
    pub reveal_millis: u64,
    /// Duration of the hide transition before removal.
    pub fade_millis: u64,
    /// Maximum message width in terminal columns.
    pub max_width: usize,
}

impl Default for ToastSettings {
    fn default() -> Self {
        Self {
            lifetime_millis: 3000,
            reveal_millis: 100,
            fade_millis: 300,
            max_width: 36,
        }
    }
}

/// How the task search matches.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-insensitive substring match on title or subject.
    #[default]
    Substring,
    /// Fuzzy match on title or subject.
    Fuzzy,
}

/// Task search settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    /// Quiet period after the last keystroke before the query applies.
    pub debounce_millis: u64,
    /// Matching strategy.
    pub mode: SearchMode,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            debounce_millis: 300,
            mode: SearchMode::Substring,
        }
    }
}

/// Theme persistence settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThemeSettings {
    /// JSON file backing the key-value store. In-memory when unset.
    pub store_path: Option<PathBuf>,
}

impl Settings {
    /// Parses settings from a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Loads settings from `path`, falling back to defaults when the file is absent.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(s) => Self::from_toml_str(&s),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let s = Settings::from_toml_str("").unwrap();
        assert_eq!(s, Settings::default());
        assert_eq!(s.pomodoro.duration_secs, 1500);
        assert_eq!(s.pomodoro.tick_interval(), Duration::from_secs(1));
        assert_eq!(s.toast.lifetime_millis, 3000);
        assert_eq!(s.search.debounce_millis, 300);
    }

    #[test]
    fn test_partial_override() {
        let s = Settings::from_toml_str(
            "[pomodoro]\nduration_secs = 60\n[search]\nmode = \"fuzzy\"\n",
        )
        .unwrap();
        assert_eq!(s.pomodoro.duration_secs, 60);
        assert_eq!(s.pomodoro.tick_millis, 1000);
        assert_eq!(s.search.mode, SearchMode::Fuzzy);
        assert_eq!(s.search.debounce_millis, 300);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(matches!(
            Settings::from_toml_str("pomodoro = ["),
            Err(Error::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(s, Settings::default());
    }
}
