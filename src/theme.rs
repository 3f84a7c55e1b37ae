//! Light and dark themes with persistence in a key-value store.

use crate::error::{Error, Result};
use lipgloss_extras::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const THEME_KEY: &str = "theme";

/// The colour scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Persisted name.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Icon for the toggle control: the theme you would switch to.
    pub fn icon(self) -> &'static str {
        match self {
            Theme::Light => "🌙",
            Theme::Dark => "☀️",
        }
    }

    /// Primary accent colour.
    pub fn primary(self) -> Color {
        match self {
            Theme::Light => Color::from("#6366F1"),
            Theme::Dark => Color::from("#818CF8"),
        }
    }

    /// Colour for secondary text.
    pub fn muted(self) -> Color {
        match self {
            Theme::Light => Color::from("#6B7280"),
            Theme::Dark => Color::from("#9CA3AF"),
        }
    }

    /// Colour for borders.
    pub fn border(self) -> Color {
        match self {
            Theme::Light => Color::from("#E5E7EB"),
            Theme::Dark => Color::from("#374151"),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(Error::UnknownTheme(other.to_string())),
        }
    }
}

/// String key-value persistence.
pub trait KeyValueStore: Send {
    /// Value under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Store that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as a flat JSON object on disk.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store at `path`. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(s) if s.trim().is_empty() => BTreeMap::new(),
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::io(path, e)),
        };
        Ok(Self { path, values })
    }

    fn flush(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json).map_err(|e| Error::io(&self.path, e))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// Current theme plus the store it is saved in.
pub struct ThemeManager {
    current: Theme,
    store: Box<dyn KeyValueStore>,
}

impl fmt::Debug for ThemeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeManager")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl ThemeManager {
    /// Loads the saved theme, defaulting to light when nothing valid is stored.
    pub fn load(store: impl KeyValueStore + 'static) -> Self {
        Self::load_boxed(Box::new(store))
    }

    /// Like [`ThemeManager::load`] for a store chosen at runtime.
    pub fn load_boxed(store: Box<dyn KeyValueStore>) -> Self {
        let current = match store.get(THEME_KEY).map(|s| s.parse::<Theme>()) {
            Some(Ok(theme)) => theme,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "ignoring saved theme");
                Theme::default()
            }
            None => Theme::default(),
        };
        Self { current, store }
    }

    /// The active theme.
    pub fn current(&self) -> Theme {
        self.current
    }

    /// Applies and persists `theme`.
    ///
    /// The theme is applied even if persisting fails; the error is returned so
    /// the caller can surface it.
    pub fn set_theme(&mut self, theme: Theme) -> Result<()> {
        self.current = theme;
        tracing::info!(%theme, "theme changed");
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// Switches between light and dark.
    pub fn toggle(&mut self) -> Result<Theme> {
        let next = self.current.toggled();
        self.set_theme(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_light() {
        let manager = ThemeManager::load(MemoryStore::default());
        assert_eq!(manager.current(), Theme::Light);
        assert_eq!(manager.current().icon(), "🌙");
    }

    #[test]
    fn test_invalid_saved_theme_falls_back() {
        let mut store = MemoryStore::default();
        store.set("theme", "sepia").unwrap();
        assert_eq!(ThemeManager::load(store).current(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut manager = ThemeManager::load(JsonFileStore::open(&path).unwrap());
        assert_eq!(manager.toggle().unwrap(), Theme::Dark);

        let reopened = ThemeManager::load(JsonFileStore::open(&path).unwrap());
        assert_eq!(reopened.current(), Theme::Dark);
    }

    #[test]
    fn test_corrupt_store_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(JsonFileStore::open(&path), Err(Error::Json(_))));
    }

    #[test]
    fn test_parse_theme_names() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!(matches!("blue".parse::<Theme>(), Err(Error::UnknownTheme(_))));
    }
}
