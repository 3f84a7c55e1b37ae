//! Application context shared by the components.
//!
//! Holds what would otherwise be process-wide mutable state: the settings, the
//! active theme and the notification permission. It is built once when the
//! application loads and handed to each component that needs part of it.

use crate::config::Settings;
use crate::error::Result;
use crate::notify::{LogNotifier, NotificationCenter, Notifier, Permission, PermissionPrompt};
use crate::theme::{JsonFileStore, KeyValueStore, MemoryStore, ThemeManager};
use std::sync::Arc;

/// Settings, theme and notifications for one application instance.
#[derive(Debug)]
pub struct AppContext {
    /// Loaded settings.
    pub settings: Settings,
    /// Theme and its persistence.
    pub theme: ThemeManager,
    /// Shared notification front.
    pub notifications: Arc<NotificationCenter>,
}

impl AppContext {
    /// Assembles a context from ready parts.
    pub fn new(
        settings: Settings,
        theme: ThemeManager,
        notifications: Arc<NotificationCenter>,
    ) -> Self {
        Self {
            settings,
            theme,
            notifications,
        }
    }

    /// Builds the context on application load.
    ///
    /// Opens the theme store named in the settings (in memory when none is
    /// configured) and resolves the notification permission, asking `prompt`
    /// only when it is still undecided.
    pub fn load(
        settings: Settings,
        notifier: impl Notifier + 'static,
        permission: Permission,
        prompt: &mut dyn PermissionPrompt,
    ) -> Result<Self> {
        let store: Box<dyn KeyValueStore> = match &settings.theme.store_path {
            Some(path) => Box::new(JsonFileStore::open(path)?),
            None => Box::new(MemoryStore::default()),
        };
        let theme = ThemeManager::load_boxed(store);
        let notifications = Arc::new(NotificationCenter::new(notifier));
        notifications.setup(permission, prompt);
        tracing::info!(
            theme = %theme.current(),
            notifications = notifications.enabled(),
            "application context loaded"
        );
        Ok(Self::new(settings, theme, notifications))
    }

    /// Default settings, an in-memory theme store and log-only notifications
    /// that stay disabled until permission is granted.
    pub fn in_memory() -> Self {
        Self::new(
            Settings::default(),
            ThemeManager::load(MemoryStore::default()),
            Arc::new(NotificationCenter::new(LogNotifier)),
        )
    }
}
