//! Footer help for component keymaps.
//!
//! Renders the bindings of any [`KeyMap`] either as a single line
//! (`s start • p pause • r reset`) or as columns when `show_all` is set.
//! Disabled bindings are skipped. When `width` is non-zero, items that do not
//! fit are replaced by an ellipsis.

use crate::key::{Binding, KeyMap};
use lipgloss_extras::lipgloss;
use lipgloss_extras::prelude::*;

/// Styles for the help view.
#[derive(Debug, Clone)]
pub struct Styles {
    /// Key label style.
    pub key: Style,
    /// Description style.
    pub desc: Style,
    /// Separator and ellipsis style.
    pub separator: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            key: Style::new().foreground(AdaptiveColor {
                Light: "#909090",
                Dark: "#626262",
            }),
            desc: Style::new().foreground(AdaptiveColor {
                Light: "#B2B2B2",
                Dark: "#4A4A4A",
            }),
            separator: Style::new().foreground(AdaptiveColor {
                Light: "#DDDADA",
                Dark: "#3C3C3C",
            }),
        }
    }
}

/// Help view state.
#[derive(Debug, Clone)]
pub struct Model {
    /// Render every column instead of the one-line summary.
    pub show_all: bool,
    /// Maximum width in columns; zero means unlimited.
    pub width: usize,
    /// Styles used when rendering.
    pub styles: Styles,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            show_all: false,
            width: 0,
            styles: Styles::default(),
        }
    }
}

const SHORT_SEPARATOR: &str = " • ";
const COLUMN_SEPARATOR: &str = "    ";
const ELLIPSIS: &str = "…";

impl Model {
    /// Creates a help view with default styles.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum width.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    /// Renders the keymap in short or full form depending on `show_all`.
    pub fn view<K: KeyMap>(&self, keymap: &K) -> String {
        if self.show_all {
            self.full_help_view(keymap.full_help())
        } else {
            self.short_help_view(keymap.short_help())
        }
    }

    fn item(&self, binding: &Binding) -> String {
        let help = binding.help();
        format!(
            "{} {}",
            self.styles.key.clone().inline(true).render(&help.key),
            self.styles.desc.clone().inline(true).render(&help.desc)
        )
    }

    fn ellipsis_tail(&self, used: usize) -> String {
        let tail = format!(
            " {}",
            self.styles.separator.clone().inline(true).render(ELLIPSIS)
        );
        if used + lipgloss::width_visible(&tail) < self.width {
            tail
        } else {
            String::new()
        }
    }

    fn overflows(&self, used: usize, extra: usize) -> bool {
        self.width > 0 && used + extra > self.width
    }

    /// Renders enabled bindings on one line.
    pub fn short_help_view(&self, bindings: Vec<&Binding>) -> String {
        let separator = self
            .styles
            .separator
            .clone()
            .inline(true)
            .render(SHORT_SEPARATOR);
        let mut out = String::new();
        let mut used = 0;

        for binding in bindings.into_iter().filter(|b| b.enabled()) {
            let sep = if used > 0 { separator.as_str() } else { "" };
            let item = format!("{}{}", sep, self.item(binding));
            let width = lipgloss::width_visible(&item);
            if self.overflows(used, width) {
                out.push_str(&self.ellipsis_tail(used));
                break;
            }
            used += width;
            out.push_str(&item);
        }
        out
    }

    /// Renders each group as a column.
    pub fn full_help_view(&self, groups: Vec<Vec<&Binding>>) -> String {
        let separator = self
            .styles
            .separator
            .clone()
            .inline(true)
            .render(COLUMN_SEPARATOR);
        let mut columns: Vec<String> = Vec::new();
        let mut used = 0;

        for group in groups {
            let rows: Vec<String> = group
                .into_iter()
                .filter(|b| b.enabled())
                .map(|b| self.item(b))
                .collect();
            if rows.is_empty() {
                continue;
            }
            let column = rows.join("\n");
            let width = lipgloss::width_visible(&column);
            if self.overflows(used, width) {
                let tail = self.ellipsis_tail(used);
                if !tail.is_empty() {
                    columns.push(tail);
                }
                break;
            }
            used += width;
            columns.push(column);
        }

        let mut parts: Vec<&str> = Vec::new();
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                parts.push(separator.as_str());
            }
            parts.push(column.as_str());
        }
        lipgloss::join_horizontal(lipgloss::TOP, &parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyCode;

    struct Keys {
        start: Binding,
        pause: Binding,
        hidden: Binding,
    }

    impl KeyMap for Keys {
        fn short_help(&self) -> Vec<&Binding> {
            vec![&self.start, &self.hidden, &self.pause]
        }

        fn full_help(&self) -> Vec<Vec<&Binding>> {
            vec![vec![&self.start, &self.pause], vec![&self.hidden]]
        }
    }

    fn keys() -> Keys {
        Keys {
            start: Binding::new(vec![KeyCode::Char('s')]).with_help("s", "start"),
            pause: Binding::new(vec![KeyCode::Char('p')]).with_help("p", "pause"),
            hidden: Binding::new(vec![KeyCode::Char('h')])
                .with_help("h", "hidden")
                .with_disabled(true),
        }
    }

    fn plain(s: &str) -> String {
        String::from_utf8(strip_ansi_escapes::strip(s)).unwrap_or_default()
    }

    #[test]
    fn test_short_view_skips_disabled() {
        let view = plain(&Model::new().view(&keys()));
        assert_eq!(view, "s start • p pause");
    }

    #[test]
    fn test_short_view_truncates_with_ellipsis() {
        let view = plain(&Model::new().with_width(12).view(&keys()));
        assert!(view.starts_with("s start"));
        assert!(!view.contains("pause"));
        assert!(view.ends_with('…'));
    }

    #[test]
    fn test_full_view_drops_empty_columns() {
        let mut help = Model::new();
        help.show_all = true;
        let view = plain(&help.view(&keys()));
        assert!(view.contains("s start"));
        assert!(view.contains("p pause"));
        assert!(!view.contains("hidden"));
    }
}
