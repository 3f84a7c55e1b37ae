//! Transient toast messages.
//!
//! Any component can ask for a toast by returning the command from [`show`];
//! the host forwards the resulting [`ShowMsg`] to its toast [`Model`]. Each
//! toast goes through three phases: it is queued, shown after a short reveal
//! delay, and hidden once its lifetime is over, then removed after the fade.
//!
//! ```rust
//! use study_planner_widgets::toast::{Model, Severity};
//! use study_planner_widgets::config::ToastSettings;
//!
//! let mut toasts = Model::new(&ToastSettings::default());
//! let _reveal = toasts.push("Task completed!", Severity::Success);
//! assert_eq!(toasts.len(), 1);
//! ```

use crate::config::ToastSettings;
use crate::key::Binding;
use crate::theme::Theme;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, KeyMsg, Msg};
use crossterm::event::KeyCode;
use lipgloss_extras::lipgloss;
use lipgloss_extras::prelude::*;
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

static LAST_STACK: AtomicI64 = AtomicI64::new(0);
static LAST_TOAST: AtomicU64 = AtomicU64::new(0);

/// How a toast is tinted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    /// Neutral information.
    #[default]
    Info,
    /// Something finished well.
    Success,
    /// Something needs attention.
    Warning,
    /// Something failed.
    Error,
}

impl Severity {
    /// Tag name.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    fn accent(self, theme: Theme) -> Color {
        match self {
            Severity::Info => theme.primary(),
            Severity::Success => Color::from("#10B981"),
            Severity::Warning => Color::from("#F59E0B"),
            Severity::Error => Color::from("#EF4444"),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to display a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowMsg {
    /// Text of the toast.
    pub message: String,
    /// Tint.
    pub severity: Severity,
}

/// Command that asks the host's toast stack to display `message`.
pub fn show(message: impl Into<String>, severity: Severity) -> Cmd {
    let msg = ShowMsg {
        message: message.into(),
        severity,
    };
    Box::pin(async move { Some(Box::new(msg) as Msg) })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Reveal,
    Hide,
    Remove,
}

#[derive(Debug, Clone)]
struct StageMsg {
    stack: i64,
    toast: u64,
    stage: Stage,
}

/// Where a toast is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Queued, not drawn yet.
    Entering,
    /// Drawn.
    Visible,
    /// Fading out, drawn dimmed.
    Leaving,
}

/// One toast.
#[derive(Debug, Clone)]
pub struct Toast {
    id: u64,
    /// Text.
    pub message: String,
    /// Tint.
    pub severity: Severity,
    phase: Phase,
}

impl Toast {
    /// Unique id of this toast.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Stack of toasts, newest last.
#[derive(Debug, Clone)]
pub struct Model {
    id: i64,
    toasts: Vec<Toast>,
    reveal: Duration,
    lifetime: Duration,
    fade: Duration,
    max_width: usize,
    /// Dismisses the newest toast.
    pub dismiss_key: Binding,
    /// Theme used for colours.
    pub theme: Theme,
}

impl Model {
    /// Creates an empty stack.
    pub fn new(settings: &ToastSettings) -> Self {
        Self {
            id: LAST_STACK.fetch_add(1, Ordering::SeqCst) + 1,
            toasts: Vec::new(),
            reveal: Duration::from_millis(settings.reveal_millis),
            lifetime: Duration::from_millis(settings.lifetime_millis),
            fade: Duration::from_millis(settings.fade_millis),
            max_width: settings.max_width.max(1),
            dismiss_key: Binding::new(vec![KeyCode::Char('x')]).with_help("x", "dismiss"),
            theme: Theme::default(),
        }
    }

    /// Number of toasts on the stack, including queued and fading ones.
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// The toasts, oldest first.
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    fn stage(&self, toast: u64, stage: Stage, after: Duration) -> Cmd {
        let stack = self.id;
        bubbletea_tick(after, move |_| {
            Box::new(StageMsg {
                stack,
                toast,
                stage,
            }) as Msg
        })
    }

    /// Queues a toast and returns the command that reveals it.
    pub fn push(&mut self, message: impl Into<String>, severity: Severity) -> Cmd {
        let id = LAST_TOAST.fetch_add(1, Ordering::SeqCst) + 1;
        let message = message.into();
        tracing::debug!(toast = id, %severity, %message, "toast");
        self.toasts.push(Toast {
            id,
            message,
            severity,
            phase: Phase::Entering,
        });
        self.stage(id, Stage::Reveal, self.reveal)
    }

    /// Starts hiding the toast `id`. Returns the removal command, or `None` if
    /// the toast is unknown or already leaving.
    pub fn dismiss(&mut self, id: u64) -> Option<Cmd> {
        let toast = self.toasts.iter_mut().find(|t| t.id == id)?;
        if toast.phase == Phase::Leaving {
            return None;
        }
        toast.phase = Phase::Leaving;
        Some(self.stage(id, Stage::Remove, self.fade))
    }

    /// Handles [`ShowMsg`], stage timers and the dismiss key.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(show) = msg.downcast_ref::<ShowMsg>() {
            return Some(self.push(show.message.clone(), show.severity));
        }

        if let Some(stage) = msg.downcast_ref::<StageMsg>() {
            if stage.stack != self.id {
                return None;
            }
            return self.advance(stage.toast, stage.stage);
        }

        if let Some(key) = msg.downcast_ref::<KeyMsg>() {
            if self.dismiss_key.matches(key) {
                let newest = self
                    .toasts
                    .iter()
                    .rev()
                    .find(|t| t.phase != Phase::Leaving)?
                    .id;
                return self.dismiss(newest);
            }
        }

        None
    }

    fn advance(&mut self, id: u64, stage: Stage) -> Option<Cmd> {
        match stage {
            Stage::Reveal => {
                let toast = self.toasts.iter_mut().find(|t| t.id == id)?;
                if toast.phase != Phase::Entering {
                    return None;
                }
                toast.phase = Phase::Visible;
                let remaining = self.lifetime.saturating_sub(self.reveal);
                Some(self.stage(id, Stage::Hide, remaining))
            }
            Stage::Hide => self.dismiss(id),
            Stage::Remove => {
                self.toasts.retain(|t| t.id != id);
                None
            }
        }
    }

    /// Renders visible and fading toasts, one per line block.
    pub fn view(&self) -> String {
        self.toasts
            .iter()
            .filter(|t| t.phase != Phase::Entering)
            .map(|t| {
                let mut style = Style::new()
                    .border_style(lipgloss::normal_border())
                    .border_left(true)
                    .border_left_foreground(t.severity.accent(self.theme))
                    .padding_left(1);
                if t.phase == Phase::Leaving {
                    style = style.faint(true);
                }
                style.render(&truncate(&t.message, self.max_width))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Cuts `s` to at most `max` display columns, ending in an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if UnicodeWidthStr::width(s) <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for g in s.graphemes(true) {
        let w = UnicodeWidthStr::width(g);
        if used + w + 1 > max {
            break;
        }
        used += w;
        out.push_str(g);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn plain(s: &str) -> String {
        String::from_utf8(strip_ansi_escapes::strip(s)).unwrap_or_default()
    }

    fn stage_msg(model: &Model, stage: Stage) -> Msg {
        Box::new(StageMsg {
            stack: model.id,
            toast: model.toasts[0].id,
            stage,
        })
    }

    #[test]
    fn test_lifecycle() {
        let mut m = Model::new(&ToastSettings::default());
        let _ = m.push("Task completed!", Severity::Success);
        assert_eq!(m.toasts()[0].phase(), Phase::Entering);
        assert_eq!(plain(&m.view()), "");

        assert!(m.update(&stage_msg(&m, Stage::Reveal)).is_some());
        assert_eq!(m.toasts()[0].phase(), Phase::Visible);
        assert!(plain(&m.view()).contains("Task completed!"));

        assert!(m.update(&stage_msg(&m, Stage::Hide)).is_some());
        assert_eq!(m.toasts()[0].phase(), Phase::Leaving);

        assert!(m.update(&stage_msg(&m, Stage::Remove)).is_none());
        assert!(m.is_empty());
    }

    #[test]
    fn test_dismiss_key_hides_newest() {
        let mut m = Model::new(&ToastSettings::default());
        let _ = m.push("first", Severity::Info);
        let _ = m.push("second", Severity::Warning);
        let key: Msg = Box::new(KeyMsg {
            key: KeyCode::Char('x'),
            modifiers: KeyModifiers::NONE,
        });
        assert!(m.update(&key).is_some());
        assert_eq!(m.toasts()[0].phase(), Phase::Entering);
        assert_eq!(m.toasts()[1].phase(), Phase::Leaving);

        // Dismissing twice does not schedule a second removal.
        let second = m.toasts()[1].id();
        assert!(m.dismiss(second).is_none());
    }

    #[test]
    fn test_other_stack_messages_ignored() {
        let mut a = Model::new(&ToastSettings::default());
        let b = Model::new(&ToastSettings::default());
        let _ = a.push("hello", Severity::Info);
        let foreign: Msg = Box::new(StageMsg {
            stack: b.id,
            toast: a.toasts[0].id,
            stage: Stage::Reveal,
        });
        assert!(a.update(&foreign).is_none());
        assert_eq!(a.toasts()[0].phase(), Phase::Entering);
    }

    #[tokio::test]
    async fn test_show_command_routes_message() {
        let msg = show("Saved", Severity::Success).await.expect("message");
        let show = msg.downcast_ref::<ShowMsg>().expect("show message");
        assert_eq!(show.message, "Saved");
        assert_eq!(show.severity.to_string(), "success");

        let mut m = Model::new(&ToastSettings::default());
        assert!(m.update(&msg).is_some());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn test_truncate_by_display_width() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("日本語テキスト", 5), "日本…");
    }
}
