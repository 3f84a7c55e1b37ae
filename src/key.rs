//! Type-safe key bindings shared by every component in this crate.
//!
//! A [`Binding`] groups one or more [`KeyPress`]es with the short help text shown
//! in the footer. Components keep their bindings in a keymap struct and implement
//! [`KeyMap`] so the [`crate::help`] view can render them.
//!
//! ```rust
//! use study_planner_widgets::key::{new_binding, with_keys_str};
//! use bubbletea_rs::KeyMsg;
//! use crossterm::event::{KeyCode, KeyModifiers};
//!
//! let start = new_binding(vec![with_keys_str(&["s", "space"])]).with_help("s", "start");
//! let msg = KeyMsg { key: KeyCode::Char(' '), modifiers: KeyModifiers::NONE };
//! assert!(start.matches(&msg));
//! ```

use bubbletea_rs::KeyMsg;
use crossterm::event::{KeyCode, KeyModifiers};

/// A single key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    /// The key code.
    pub code: KeyCode,
    /// Modifiers that must be held.
    pub modifiers: KeyModifiers,
}

impl From<KeyCode> for KeyPress {
    fn from(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }
}

impl From<(KeyCode, KeyModifiers)> for KeyPress {
    fn from((code, modifiers): (KeyCode, KeyModifiers)) -> Self {
        Self { code, modifiers }
    }
}

/// Help text displayed for a binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Help {
    /// The key label, e.g. `"s"`.
    pub key: String,
    /// What the key does, e.g. `"start"`.
    pub desc: String,
}

/// A named set of key presses that trigger one action.
#[derive(Debug, Clone, Default)]
pub struct Binding {
    keys: Vec<KeyPress>,
    help: Help,
    disabled: bool,
}

impl Binding {
    /// Creates a binding from anything convertible into key presses.
    pub fn new<K: Into<KeyPress>>(keys: Vec<K>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            help: Help::default(),
            disabled: false,
        }
    }

    /// Sets the help label and description.
    pub fn with_help(mut self, key: impl Into<String>, desc: impl Into<String>) -> Self {
        self.help = Help {
            key: key.into(),
            desc: desc.into(),
        };
        self
    }

    /// Disables or re-enables the binding.
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Toggles the binding at runtime.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.disabled = !enabled;
    }

    /// Whether the binding currently responds and shows up in help.
    pub fn enabled(&self) -> bool {
        !self.disabled && !self.keys.is_empty()
    }

    /// The help text.
    pub fn help(&self) -> &Help {
        &self.help
    }

    /// The key presses of this binding.
    pub fn keys(&self) -> &[KeyPress] {
        &self.keys
    }

    /// Reports whether `msg` triggers this binding.
    ///
    /// Character keys ignore the shift modifier since the terminal already
    /// reports the shifted character.
    pub fn matches(&self, msg: &KeyMsg) -> bool {
        if !self.enabled() {
            return false;
        }
        self.keys.iter().any(|press| {
            if press.code != msg.key {
                return false;
            }
            match msg.key {
                KeyCode::Char(_) => {
                    press.modifiers == msg.modifiers.difference(KeyModifiers::SHIFT)
                }
                _ => press.modifiers == msg.modifiers,
            }
        })
    }
}

/// Implemented by component keymaps so help views can render them.
pub trait KeyMap {
    /// Bindings for the one-line footer.
    fn short_help(&self) -> Vec<&Binding>;
    /// Bindings grouped into columns for the expanded view.
    fn full_help(&self) -> Vec<Vec<&Binding>>;
}

/// Builds a binding from pre-parsed key groups.
pub fn new_binding(groups: Vec<Vec<KeyPress>>) -> Binding {
    Binding::new(groups.into_iter().flatten().collect())
}

/// Parses key names such as `"ctrl+c"`, `"esc"` or `"q"` into key presses.
///
/// Unknown names are skipped.
pub fn with_keys_str(names: &[&str]) -> Vec<KeyPress> {
    names.iter().filter_map(|name| parse_key(name)).collect()
}

/// Reports whether `msg` triggers any of `bindings`.
pub fn matches(msg: &KeyMsg, bindings: &[&Binding]) -> bool {
    bindings.iter().any(|b| b.matches(msg))
}

fn parse_key(name: &str) -> Option<KeyPress> {
    let mut modifiers = KeyModifiers::NONE;
    let mut rest = name;
    loop {
        if let Some(tail) = rest.strip_prefix("ctrl+") {
            modifiers |= KeyModifiers::CONTROL;
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("alt+") {
            modifiers |= KeyModifiers::ALT;
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix("shift+") {
            modifiers |= KeyModifiers::SHIFT;
            rest = tail;
        } else {
            break;
        }
    }

    let code = match rest {
        "enter" => KeyCode::Enter,
        "esc" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pgup" => KeyCode::PageUp,
        "pgdown" => KeyCode::PageDown,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => return None,
            }
        }
    };
    Some(KeyPress { code, modifiers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyMsg {
        KeyMsg {
            key: code,
            modifiers,
        }
    }

    #[test]
    fn test_parse_named_and_modified_keys() {
        let presses = with_keys_str(&["ctrl+c", "esc", "q", "bogus"]);
        assert_eq!(presses.len(), 3);
        assert_eq!(
            presses[0],
            KeyPress {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL
            }
        );
        assert_eq!(presses[1], KeyPress::from(KeyCode::Esc));
        assert_eq!(presses[2], KeyPress::from(KeyCode::Char('q')));
    }

    #[test]
    fn test_matches_respects_modifiers() {
        let quit = new_binding(vec![with_keys_str(&["ctrl+c"])]);
        assert!(quit.matches(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!quit.matches(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
    }

    #[test]
    fn test_shifted_characters_match() {
        let upper = Binding::new(vec![KeyCode::Char('G')]);
        assert!(upper.matches(&key(KeyCode::Char('G'), KeyModifiers::SHIFT)));
    }

    #[test]
    fn test_disabled_binding_never_matches() {
        let mut b = Binding::new(vec![KeyCode::Char('s')]).with_help("s", "start");
        b.set_enabled(false);
        assert!(!b.enabled());
        assert!(!b.matches(&key(KeyCode::Char('s'), KeyModifiers::NONE)));
        assert!(!matches(&key(KeyCode::Char('s'), KeyModifiers::NONE), &[&b]));
    }
}
