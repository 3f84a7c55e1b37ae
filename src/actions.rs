//! Quick actions offered on the dashboard.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A dashboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    /// Create a task.
    AddTask,
    /// Create an exam.
    AddExam,
    /// Open the Pomodoro modal.
    StartPomodoro,
    /// Show the calendar.
    ViewCalendar,
    /// Edit subjects.
    ManageSubjects,
}

/// What the host should do for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Go to another page of the planner.
    Navigate(&'static str),
    /// Open the countdown widget.
    OpenPomodoro,
}

impl QuickAction {
    /// Every action, in dashboard order.
    pub const ALL: [QuickAction; 5] = [
        QuickAction::AddTask,
        QuickAction::AddExam,
        QuickAction::StartPomodoro,
        QuickAction::ViewCalendar,
        QuickAction::ManageSubjects,
    ];

    /// Action name as used by the dashboard buttons.
    pub fn name(self) -> &'static str {
        match self {
            QuickAction::AddTask => "add-task",
            QuickAction::AddExam => "add-exam",
            QuickAction::StartPomodoro => "start-pomodoro",
            QuickAction::ViewCalendar => "view-calendar",
            QuickAction::ManageSubjects => "manage-subjects",
        }
    }

    /// What triggering the action leads to.
    pub fn outcome(self) -> Outcome {
        let outcome = match self {
            QuickAction::AddTask => Outcome::Navigate("/tasks/new"),
            QuickAction::AddExam => Outcome::Navigate("/tasks/exam/new"),
            QuickAction::StartPomodoro => Outcome::OpenPomodoro,
            QuickAction::ViewCalendar => Outcome::Navigate("/calendar"),
            QuickAction::ManageSubjects => Outcome::Navigate("/tasks/subjects"),
        };
        tracing::info!(action = self.name(), ?outcome, "quick action");
        outcome
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuickAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        QuickAction::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| {
                tracing::warn!(action = s, "unknown quick action");
                Error::UnknownAction(s.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for action in QuickAction::ALL {
            assert_eq!(action.name().parse::<QuickAction>().unwrap(), action);
        }
    }

    #[test]
    fn test_outcomes() {
        assert_eq!(QuickAction::StartPomodoro.outcome(), Outcome::OpenPomodoro);
        assert_eq!(
            "add-exam".parse::<QuickAction>().unwrap().outcome(),
            Outcome::Navigate("/tasks/exam/new")
        );
    }

    #[test]
    fn test_unknown_action() {
        assert!(matches!(
            "launch-rocket".parse::<QuickAction>(),
            Err(Error::UnknownAction(name)) if name == "launch-rocket"
        ));
    }
}
