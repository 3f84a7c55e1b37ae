//! Pomodoro countdown widget.
//!
//! A single 25 minute countdown bound to one modal. The widget owns the
//! remaining time, its status and, while running, the [`TickHandle`] of its
//! one-second tick. The handle lives inside the running phase, so a tick is
//! armed exactly when the widget is running.
//!
//! ```text
//! Idle ──start──▶ Running ──pause──▶ Paused ──start──▶ Running
//!                   │  ▲
//!                   └──┘ tick (remaining -= 1)
//!                   │
//!                   └─ tick reaching 0 ──▶ Completed
//! any ──reset──▶ Idle (1500 s)
//! ```
//!
//! When the countdown reaches zero the widget notifies through the
//! application's [`NotificationCenter`] and returns a [`toast::show`] command
//! for the host's toast stack.
//!
//! # bubbletea-rs Integration
//!
//! ```rust
//! use bubbletea_rs::{Cmd, Model as BubbleTeaModel, Msg};
//! use study_planner_widgets::context::AppContext;
//! use study_planner_widgets::pomodoro;
//!
//! struct App {
//!     timer: pomodoro::Model,
//! }
//!
//! impl BubbleTeaModel for App {
//!     fn init() -> (Self, Option<Cmd>) {
//!         let ctx = AppContext::in_memory();
//!         let mut timer = pomodoro::Model::new(&ctx);
//!         let cmd = timer.start();
//!         (Self { timer }, cmd)
//!     }
//!
//!     fn update(&mut self, msg: Msg) -> Option<Cmd> {
//!         self.timer.update(&msg)
//!     }
//!
//!     fn view(&self) -> String {
//!         self.timer.view()
//!     }
//! }
//! ```

use crate::context::AppContext;
use crate::help;
use crate::key::{self, new_binding, with_keys_str, Binding};
use crate::notify::NotificationCenter;
use crate::schedule::{RuntimeScheduler, Scheduler, TickHandle, TickMsg};
use crate::theme::Theme;
use crate::toast::{self, Severity};
use crate::Component;
use bubbletea_rs::{Cmd, KeyMsg, Model as BubbleTeaModel, Msg};
use lipgloss_extras::lipgloss;
use lipgloss_extras::prelude::*;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Length of one session: 25 minutes.
pub const DEFAULT_DURATION_SECS: u64 = 25 * 60;

/// Title of the completion notification.
pub const NOTIFICATION_TITLE: &str = "AI Pomodoro";
/// Body of the completion notification.
pub const NOTIFICATION_BODY: &str = "Study session completed! Time for a break.";
/// Text of the completion toast.
pub const COMPLETED_TOAST: &str = "Pomodoro session completed! Take a break.";

const INFO_TEXT: &str = "Focus on your studies for 25 minutes, then take a 5-minute break.";

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

/// Renders seconds as `MM:SS`, both fields zero-padded to at least two digits.
///
/// ```rust
/// use study_planner_widgets::pomodoro::format_clock;
///
/// assert_eq!(format_clock(1500), "25:00");
/// assert_eq!(format_clock(65), "01:05");
/// assert_eq!(format_clock(0), "00:00");
/// ```
pub fn format_clock(remaining_secs: u64) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// Where the countdown is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Not started, or reset.
    Idle,
    /// Counting down.
    Running,
    /// Stopped mid-session; start resumes.
    Paused,
    /// Reached zero.
    Completed,
}

impl Status {
    fn label(self) -> &'static str {
        match self {
            Status::Idle => "Ready",
            Status::Running => "Focusing",
            Status::Paused => "Paused",
            Status::Completed => "Done, take a break",
        }
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Running(TickHandle),
    Paused,
    Completed,
}

impl Phase {
    fn status(&self) -> Status {
        match self {
            Phase::Idle => Status::Idle,
            Phase::Running(_) => Status::Running,
            Phase::Paused => Status::Paused,
            Phase::Completed => Status::Completed,
        }
    }
}

/// Key bindings of the widget's controls.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Start or resume.
    pub start: Binding,
    /// Pause.
    pub pause: Binding,
    /// Reset to the full session.
    pub reset: Binding,
    /// Close the modal.
    pub close: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            start: new_binding(vec![with_keys_str(&["s", "space"])]).with_help("s", "start"),
            pause: new_binding(vec![with_keys_str(&["p"])]).with_help("p", "pause"),
            reset: new_binding(vec![with_keys_str(&["r"])]).with_help("r", "reset"),
            close: new_binding(vec![with_keys_str(&["esc", "q"])]).with_help("esc", "close"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.start, &self.pause, &self.reset, &self.close]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![vec![&self.start, &self.pause, &self.reset], vec![&self.close]]
    }
}

/// Styles of the modal.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Outer frame.
    pub frame: Style,
    /// Header line.
    pub title: Style,
    /// The `MM:SS` clock.
    pub clock: Style,
    /// Status line under the clock.
    pub status: Style,
    /// Explanatory text.
    pub info: Style,
}

impl Styles {
    /// Styles matching `theme`.
    pub fn for_theme(theme: Theme) -> Self {
        Self {
            frame: Style::new()
                .border_style(lipgloss::normal_border())
                .border_top(true)
                .border_bottom(true)
                .border_left(true)
                .border_right(true)
                .border_top_foreground(theme.border())
                .border_bottom_foreground(theme.border())
                .border_left_foreground(theme.border())
                .border_right_foreground(theme.border())
                .padding(1, 2, 1, 2),
            title: Style::new().bold(true),
            clock: Style::new().bold(true).foreground(theme.primary()),
            status: Style::new().foreground(theme.muted()),
            info: Style::new().foreground(theme.muted()).italic(true),
        }
    }
}

impl Default for Styles {
    fn default() -> Self {
        Self::for_theme(Theme::default())
    }
}

/// The countdown widget.
///
/// Generic over the [`Scheduler`] that delivers its ticks; applications use the
/// default [`RuntimeScheduler`], tests and headless hosts a
/// [`crate::schedule::ManualScheduler`].
#[derive(Debug)]
pub struct Model<S: Scheduler = RuntimeScheduler> {
    id: i64,
    initial_secs: u64,
    remaining_secs: u64,
    interval: Duration,
    phase: Phase,
    open: bool,
    focus: bool,
    completions: usize,
    scheduler: S,
    notifications: Option<Arc<NotificationCenter>>,
    /// Control bindings.
    pub keymap: KeyMap,
    /// Footer help.
    pub help: help::Model,
    /// Rendering styles.
    pub styles: Styles,
}

impl Model<RuntimeScheduler> {
    /// Opens a widget configured from the application context.
    pub fn new(ctx: &AppContext) -> Self {
        let pomodoro = &ctx.settings.pomodoro;
        Model::with_scheduler(
            pomodoro.duration_secs,
            pomodoro.tick_interval(),
            RuntimeScheduler::new(),
        )
        .with_notifications(Arc::clone(&ctx.notifications))
        .with_theme(ctx.theme.current())
    }
}

impl<S: Scheduler> Model<S> {
    /// Opens an idle widget counting `duration_secs` in steps of `interval`.
    pub fn with_scheduler(duration_secs: u64, interval: Duration, scheduler: S) -> Self {
        Self {
            id: next_id(),
            initial_secs: duration_secs,
            remaining_secs: duration_secs,
            interval,
            phase: Phase::Idle,
            open: true,
            focus: true,
            completions: 0,
            scheduler,
            notifications: None,
            keymap: KeyMap::default(),
            help: help::Model::new(),
            styles: Styles::default(),
        }
    }

    /// Sends completion notifications through `center`.
    pub fn with_notifications(mut self, center: Arc<NotificationCenter>) -> Self {
        self.notifications = Some(center);
        self
    }

    /// Uses colours from `theme`.
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.styles = Styles::for_theme(theme);
        self
    }

    /// Unique id of this widget instance.
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.phase.status()
    }

    /// Seconds left in the session.
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// Whether a tick is armed.
    pub fn ticking(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// Whether the modal is still on screen.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// How many times the countdown reached zero.
    pub fn completions(&self) -> usize {
        self.completions
    }

    /// The scheduler delivering ticks.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// The remaining time as `MM:SS`.
    pub fn display(&self) -> String {
        format_clock(self.remaining_secs)
    }

    /// Starts or resumes the countdown.
    ///
    /// Does nothing while running, after completion (reset first) or once the
    /// modal is closed, so a repeated start never arms a second tick.
    pub fn start(&mut self) -> Option<Cmd> {
        if !self.open {
            return None;
        }
        match self.phase {
            Phase::Idle | Phase::Paused => {
                let (handle, cmd) = self.scheduler.schedule_periodic(self.interval);
                tracing::debug!(
                    widget = self.id,
                    handle = handle.id(),
                    remaining = self.remaining_secs,
                    "pomodoro started"
                );
                self.phase = Phase::Running(handle);
                cmd
            }
            Phase::Running(_) | Phase::Completed => None,
        }
    }

    /// Pauses a running countdown, keeping the remaining time.
    pub fn pause(&mut self) {
        if !self.ticking() {
            return;
        }
        self.disarm(Phase::Paused);
        tracing::debug!(widget = self.id, remaining = self.remaining_secs, "pomodoro paused");
    }

    /// Returns to an idle full-length session from any state.
    pub fn reset(&mut self) {
        self.disarm(Phase::Idle);
        self.remaining_secs = self.initial_secs;
        tracing::debug!(widget = self.id, "pomodoro reset");
    }

    /// Tears the modal down. Any armed tick is cancelled and later ticks are
    /// ignored.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        let next = match self.phase {
            Phase::Running(_) => Phase::Paused,
            Phase::Idle => Phase::Idle,
            Phase::Paused => Phase::Paused,
            Phase::Completed => Phase::Completed,
        };
        self.disarm(next);
        self.open = false;
        self.focus = false;
        tracing::debug!(widget = self.id, "pomodoro closed");
    }

    fn disarm(&mut self, next: Phase) {
        if let Phase::Running(handle) = std::mem::replace(&mut self.phase, next) {
            self.scheduler.cancel(handle);
        }
    }

    fn on_tick(&mut self, tick: &TickMsg) -> Option<Cmd> {
        let Phase::Running(handle) = &self.phase else {
            tracing::trace!(widget = self.id, handle = tick.handle(), "tick while not running");
            return None;
        };
        if !tick.is_from(handle) {
            tracing::trace!(widget = self.id, handle = tick.handle(), "stale tick");
            return None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.complete());
        }
        self.scheduler.rearm(handle)
    }

    fn complete(&mut self) -> Cmd {
        self.disarm(Phase::Completed);
        self.completions += 1;
        tracing::info!(widget = self.id, "pomodoro session completed");
        if let Some(center) = &self.notifications {
            center.notify(NOTIFICATION_TITLE, NOTIFICATION_BODY);
        }
        toast::show(COMPLETED_TOAST, Severity::Success)
    }

    /// Handles ticks and, while focused, the control keys.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(tick) = msg.downcast_ref::<TickMsg>() {
            return self.on_tick(tick);
        }

        if !self.open || !self.focus {
            return None;
        }

        if let Some(key_msg) = msg.downcast_ref::<KeyMsg>() {
            if self.keymap.start.matches(key_msg) {
                return self.start();
            } else if self.keymap.pause.matches(key_msg) {
                self.pause();
            } else if self.keymap.reset.matches(key_msg) {
                self.reset();
            } else if self.keymap.close.matches(key_msg) {
                self.close();
            }
        }

        None
    }

    /// Renders the modal, or nothing once closed.
    pub fn view(&self) -> String {
        if !self.open {
            return String::new();
        }

        let body = [
            self.styles.title.render("🧠 AI Pomodoro Timer"),
            String::new(),
            self.styles.clock.render(&self.display()),
            self.styles.status.render(self.status().label()),
            String::new(),
            self.styles.info.render(INFO_TEXT),
            String::new(),
            self.help.view(&self.keymap),
        ]
        .join("\n");

        self.styles.frame.render(&body)
    }
}

impl<S: Scheduler> Component for Model<S> {
    fn focus(&mut self) -> Option<Cmd> {
        self.focus = self.open;
        None
    }

    fn blur(&mut self) {
        self.focus = false;
    }

    fn focused(&self) -> bool {
        self.focus
    }
}

impl<S: Scheduler> Drop for Model<S> {
    fn drop(&mut self) {
        self.disarm(Phase::Idle);
    }
}

impl BubbleTeaModel for Model<RuntimeScheduler> {
    fn init() -> (Self, Option<Cmd>) {
        (Self::new(&AppContext::in_memory()), None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        Model::update(self, &msg)
    }

    fn view(&self) -> String {
        Model::view(self)
    }
}
