#![warn(missing_docs)]

//! # study-planner-widgets
//!
//! Terminal presentation layer for a study planner, built as
//! [bubbletea-rs](https://github.com/joshka/bubbletea-rs) components.
//!
//! ## Components
//!
//! - **Pomodoro**: a 25 minute countdown modal with start, pause and reset,
//!   driven by a cancellable periodic tick ([`pomodoro`], [`schedule`])
//! - **Toasts**: transient messages tinted by severity ([`toast`])
//! - **Tasks**: task list with debounced search and completion tracking ([`tasks`])
//! - **Help**: footer key hints for any keymap ([`help`], [`key`])
//!
//! Each component follows the Elm architecture: `update()` consumes a message
//! and may return a command, `view()` renders the current state.
//!
//! ## Application context
//!
//! Settings, the active theme and the notification permission live in an
//! [`context::AppContext`] built once at startup and handed to the components
//! that need it:
//!
//! ```rust
//! use study_planner_widgets::prelude::*;
//!
//! let ctx = AppContext::in_memory();
//! let mut timer = Pomodoro::new(&ctx);
//! let _tick = timer.start();
//! assert_eq!(timer.status(), PomodoroStatus::Running);
//! assert_eq!(timer.display(), "25:00");
//! ```
//!
//! ## Routing toasts
//!
//! Components that want to show a toast return the command from
//! [`toast::show`]. The host forwards every message to its toast stack:
//!
//! ```rust
//! use bubbletea_rs::{Cmd, Model, Msg};
//! use study_planner_widgets::prelude::*;
//!
//! struct App {
//!     timer: Pomodoro,
//!     toasts: Toasts,
//! }
//!
//! impl Model for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let ctx = AppContext::in_memory();
//!         let app = App {
//!             timer: Pomodoro::new(&ctx),
//!             toasts: Toasts::new(&ctx.settings.toast),
//!         };
//!         (app, None)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         if let Some(cmd) = self.toasts.update(&msg) {
//!             return Some(cmd);
//!         }
//!         self.timer.update(&msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         format!("{}\n{}", self.timer.view(), self.toasts.view())
//!     }
//! }
//! ```

pub mod actions;
pub mod config;
pub mod context;
pub mod error;
pub mod help;
pub mod key;
pub mod notify;
pub mod pomodoro;
pub mod schedule;
pub mod tasks;
pub mod theme;
pub mod toast;

use bubbletea_rs::Cmd;

/// Components that can take and release keyboard focus.
///
/// A focused component handles key messages; a blurred one ignores them but
/// keeps processing its own timers.
pub trait Component {
    /// Gives the component focus. May return a command.
    fn focus(&mut self) -> Option<Cmd>;

    /// Takes focus away.
    fn blur(&mut self);

    /// Whether the component has focus.
    fn focused(&self) -> bool;
}

pub use actions::{Outcome, QuickAction};
pub use config::Settings;
pub use context::AppContext;
pub use error::{Error, Result};
pub use pomodoro::{format_clock, Model as Pomodoro, Status as PomodoroStatus};
pub use schedule::{ManualScheduler, RuntimeScheduler, Scheduler, TickHandle, TickMsg};
pub use tasks::{Model as TaskList, Task, TaskService};
pub use theme::Theme;
pub use toast::{Model as Toasts, Severity};

/// Common imports.
///
/// ```rust
/// use study_planner_widgets::prelude::*;
/// ```
pub mod prelude {
    pub use crate::actions::{Outcome, QuickAction};
    pub use crate::config::Settings;
    pub use crate::context::AppContext;
    pub use crate::help::Model as HelpModel;
    pub use crate::key::{matches, new_binding, with_keys_str, Binding, KeyMap, KeyPress};
    pub use crate::notify::{NotificationCenter, Notifier, Permission};
    pub use crate::pomodoro::{format_clock, Model as Pomodoro, Status as PomodoroStatus};
    pub use crate::schedule::{ManualScheduler, RuntimeScheduler, Scheduler};
    pub use crate::tasks::{InMemoryTaskService, Model as TaskList, Task, TaskService};
    pub use crate::theme::{Theme, ThemeManager};
    pub use crate::toast::{show as show_toast, Model as Toasts, Severity};
    pub use crate::Component;
}
