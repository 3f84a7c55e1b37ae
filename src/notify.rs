//! Desktop-style notifications gated by a permission.
//!
//! The [`NotificationCenter`] replaces a global "notifications enabled" flag:
//! it is created once with the application context and shared with whichever
//! component needs to notify.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};

/// Permission to show notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// The user has not decided yet.
    #[default]
    Default,
    /// Notifications may be shown.
    Granted,
    /// Notifications must not be shown.
    Denied,
}

impl Permission {
    fn to_u8(self) -> u8 {
        match self {
            Permission::Default => 0,
            Permission::Granted => 1,
            Permission::Denied => 2,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => Permission::Granted,
            2 => Permission::Denied,
            _ => Permission::Default,
        }
    }
}

/// Asks the user for notification permission.
pub trait PermissionPrompt {
    /// Returns the user's decision.
    fn request(&mut self) -> Permission;
}

impl<F: FnMut() -> Permission> PermissionPrompt for F {
    fn request(&mut self) -> Permission {
        self()
    }
}

/// Something that can show a notification with a title and a body.
pub trait Notifier: Send + Sync {
    /// Shows the notification.
    fn notify(&self, title: &str, body: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, title: &str, body: &str) {
        tracing::info!(%title, %body, "notification");
    }
}

/// Rings the terminal bell and logs the notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct BellNotifier;

impl Notifier for BellNotifier {
    fn notify(&self, title: &str, body: &str) {
        let mut out = std::io::stdout();
        if let Err(e) = out.write_all(b"\x07").and_then(|_| out.flush()) {
            tracing::warn!(error = %e, "could not ring terminal bell");
        }
        tracing::info!(%title, %body, "notification");
    }
}

/// Permission-gated front for a [`Notifier`] backend.
pub struct NotificationCenter {
    permission: AtomicU8,
    backend: Box<dyn Notifier>,
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("permission", &self.permission())
            .finish_non_exhaustive()
    }
}

impl NotificationCenter {
    /// Creates a center with an undecided permission.
    pub fn new(backend: impl Notifier + 'static) -> Self {
        Self {
            permission: AtomicU8::new(Permission::Default.to_u8()),
            backend: Box::new(backend),
        }
    }

    /// Resolves the permission on load.
    ///
    /// An already granted or denied permission is kept as is. An undecided one
    /// asks `prompt`; notifications are enabled only if it grants.
    pub fn setup(&self, current: Permission, prompt: &mut dyn PermissionPrompt) -> Permission {
        let resolved = match current {
            Permission::Default => prompt.request(),
            decided => decided,
        };
        self.set_permission(resolved);
        tracing::debug!(?resolved, "notification permission");
        resolved
    }

    /// Overrides the permission.
    pub fn set_permission(&self, permission: Permission) {
        self.permission.store(permission.to_u8(), Ordering::Release);
    }

    /// The current permission.
    pub fn permission(&self) -> Permission {
        Permission::from_u8(self.permission.load(Ordering::Acquire))
    }

    /// Whether notifications are shown.
    pub fn enabled(&self) -> bool {
        self.permission() == Permission::Granted
    }

    /// Shows a notification if permitted. Returns whether it was shown.
    pub fn notify(&self, title: &str, body: &str) -> bool {
        if !self.enabled() {
            tracing::debug!(%title, "notification suppressed");
            return false;
        }
        self.backend.notify(title, body);
        true
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Notifier;
    use std::sync::{Arc, Mutex};

    /// Records every notification it receives.
    #[derive(Debug, Default, Clone)]
    pub struct Recorder {
        pub seen: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl Recorder {
        pub fn count(&self) -> usize {
            self.seen.lock().map(|v| v.len()).unwrap_or(0)
        }
    }

    impl Notifier for Recorder {
        fn notify(&self, title: &str, body: &str) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push((title.to_string(), body.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Recorder;
    use super::*;

    #[test]
    fn test_granted_is_kept_without_prompting() {
        let center = NotificationCenter::new(LogNotifier);
        let mut asked = false;
        let mut prompt = || {
            asked = true;
            Permission::Denied
        };
        assert_eq!(center.setup(Permission::Granted, &mut prompt), Permission::Granted);
        assert!(!asked);
        assert!(center.enabled());
    }

    #[test]
    fn test_undecided_asks_the_prompt() {
        let center = NotificationCenter::new(LogNotifier);
        let mut prompt = || Permission::Granted;
        center.setup(Permission::Default, &mut prompt);
        assert!(center.enabled());

        let mut refuse = || Permission::Denied;
        center.setup(Permission::Default, &mut refuse);
        assert!(!center.enabled());
    }

    #[test]
    fn test_denied_suppresses_notifications() {
        let recorder = Recorder::default();
        let center = NotificationCenter::new(recorder.clone());
        let mut prompt = || Permission::Granted;
        center.setup(Permission::Denied, &mut prompt);
        assert!(!center.notify("title", "body"));
        assert_eq!(recorder.count(), 0);

        center.set_permission(Permission::Granted);
        assert!(center.notify("title", "body"));
        assert_eq!(recorder.count(), 1);
    }
}
