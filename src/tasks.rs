//! Task list with debounced search and completion tracking.
//!
//! Checking a task asks the [`TaskService`] to record the completion and only
//! marks the task done once the service agrees. Unchecking stays local: the
//! service has no "uncomplete" request, so nothing is sent.
//!
//! Search input is applied after a quiet period (300ms by default). Each
//! keystroke bumps a generation counter and only the timer of the latest
//! generation applies the query.

use crate::config::{SearchMode, SearchSettings};
use crate::error::{Error, Result};
use crate::help;
use crate::key::{self, new_binding, with_keys_str, Binding};
use crate::theme::Theme;
use crate::toast::{self, Severity};
use crate::Component;
use bubbletea_rs::{tick as bubbletea_tick, Cmd, KeyMsg, Msg};
use crossterm::event::{KeyCode, KeyModifiers};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use lipgloss_extras::prelude::*;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

static LAST_ID: AtomicI64 = AtomicI64::new(0);

fn next_id() -> i64 {
    LAST_ID.fetch_add(1, Ordering::SeqCst) + 1
}

const PROGRESS_CELLS: usize = 20;

/// One study task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Server-side id.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Subject the task belongs to.
    pub subject: String,
    /// Whether it is done.
    pub completed: bool,
}

impl Task {
    /// An open task.
    pub fn new(id: u64, title: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            subject: subject.into(),
            completed: false,
        }
    }
}

/// The server endpoint that records completions.
pub trait TaskService: Send + Sync {
    /// Marks task `id` complete on the server.
    ///
    /// Called on tokio's blocking pool, so implementations may block on I/O.
    fn complete(&self, id: u64) -> Result<()>;
}

/// Service keeping completions in memory; some ids can be set to fail.
#[derive(Debug, Default)]
pub struct InMemoryTaskService {
    completed: Mutex<BTreeSet<u64>>,
    failing: BTreeSet<u64>,
}

impl InMemoryTaskService {
    /// A service that accepts every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that refuses the given ids.
    pub fn failing(ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            completed: Mutex::default(),
            failing: ids.into_iter().collect(),
        }
    }

    /// Ids recorded as completed.
    pub fn completed(&self) -> BTreeSet<u64> {
        self.completed
            .lock()
            .map(|set| set.clone())
            .unwrap_or_default()
    }
}

impl TaskService for InMemoryTaskService {
    fn complete(&self, id: u64) -> Result<()> {
        if self.failing.contains(&id) {
            return Err(Error::Task {
                task_id: id,
                message: "rejected".to_string(),
            });
        }
        if let Ok(mut set) = self.completed.lock() {
            set.insert(id);
        }
        Ok(())
    }
}

/// Result of a completion request.
#[derive(Debug, Clone)]
pub struct CompletionMsg {
    list: i64,
    task_id: u64,
    error: Option<String>,
}

#[derive(Debug, Clone)]
struct SearchMsg {
    list: i64,
    generation: u64,
}

/// Key bindings of the list.
#[derive(Debug, Clone)]
pub struct KeyMap {
    /// Move up.
    pub up: Binding,
    /// Move down.
    pub down: Binding,
    /// Check or uncheck the selected task.
    pub toggle: Binding,
    /// Start typing a search.
    pub search: Binding,
    /// Stop typing, keeping the query.
    pub done_searching: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            up: new_binding(vec![with_keys_str(&["up", "k"])]).with_help("↑/k", "up"),
            down: new_binding(vec![with_keys_str(&["down", "j"])]).with_help("↓/j", "down"),
            toggle: new_binding(vec![with_keys_str(&["space", "enter"])])
                .with_help("space", "complete"),
            search: new_binding(vec![with_keys_str(&["/"])]).with_help("/", "search"),
            done_searching: new_binding(vec![with_keys_str(&["esc", "enter"])])
                .with_help("esc", "done"),
        }
    }
}

impl key::KeyMap for KeyMap {
    fn short_help(&self) -> Vec<&Binding> {
        vec![&self.up, &self.down, &self.toggle, &self.search]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![
            vec![&self.up, &self.down],
            vec![&self.toggle],
            vec![&self.search, &self.done_searching],
        ]
    }
}

/// The task list.
pub struct Model {
    id: i64,
    tasks: Vec<Task>,
    cursor: usize,
    query: String,
    applied: String,
    generation: u64,
    debounce: Duration,
    mode: SearchMode,
    searching: bool,
    pending: BTreeSet<u64>,
    service: Arc<dyn TaskService>,
    /// Key bindings.
    pub keymap: KeyMap,
    /// Footer help.
    pub help: help::Model,
    /// Theme used for colours.
    pub theme: Theme,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("tasks", &self.tasks)
            .field("cursor", &self.cursor)
            .field("query", &self.query)
            .field("applied", &self.applied)
            .field("searching", &self.searching)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Creates a list over `tasks` backed by `service`.
    pub fn new(tasks: Vec<Task>, service: Arc<dyn TaskService>, search: &SearchSettings) -> Self {
        Self {
            id: next_id(),
            tasks,
            cursor: 0,
            query: String::new(),
            applied: String::new(),
            generation: 0,
            debounce: Duration::from_millis(search.debounce_millis),
            mode: search.mode,
            searching: false,
            pending: BTreeSet::new(),
            service,
            keymap: KeyMap::default(),
            help: help::Model::new(),
            theme: Theme::default(),
        }
    }

    /// All tasks.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// The query as typed.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The query currently filtering the list.
    pub fn applied_query(&self) -> &str {
        &self.applied
    }

    /// Tasks matching the applied query.
    pub fn visible(&self) -> Vec<&Task> {
        if self.applied.is_empty() {
            return self.tasks.iter().collect();
        }
        match self.mode {
            SearchMode::Substring => {
                let needle = self.applied.to_lowercase();
                self.tasks
                    .iter()
                    .filter(|t| {
                        t.title.to_lowercase().contains(&needle)
                            || t.subject.to_lowercase().contains(&needle)
                    })
                    .collect()
            }
            SearchMode::Fuzzy => {
                let matcher = SkimMatcherV2::default();
                let mut scored: Vec<(i64, &Task)> = self
                    .tasks
                    .iter()
                    .filter_map(|t| {
                        let title = matcher.fuzzy_match(&t.title, &self.applied);
                        let subject = matcher.fuzzy_match(&t.subject, &self.applied);
                        title.max(subject).map(|score| (score, t))
                    })
                    .collect();
                scored.sort_by(|a, b| b.0.cmp(&a.0));
                scored.into_iter().map(|(_, t)| t).collect()
            }
        }
    }

    /// The task under the cursor.
    pub fn selected(&self) -> Option<&Task> {
        self.visible().get(self.cursor).copied()
    }

    /// Completed percentage rounded to the nearest whole number, 0 for an
    /// empty list.
    pub fn progress(&self) -> u8 {
        let len = self.tasks.len();
        if len == 0 {
            return 0;
        }
        let done = self.tasks.iter().filter(|t| t.completed).count();
        ((done * 200 + len) / (2 * len)) as u8
    }

    /// Replaces the typed query and schedules it to apply after the debounce.
    pub fn set_query(&mut self, query: impl Into<String>) -> Cmd {
        self.query = query.into();
        self.generation += 1;
        let list = self.id;
        let generation = self.generation;
        bubbletea_tick(self.debounce, move |_| {
            Box::new(SearchMsg { list, generation }) as Msg
        })
    }

    /// Checks or unchecks task `id`.
    ///
    /// Checking returns the command performing the service request; the task
    /// is marked done when its [`CompletionMsg`] succeeds. Unchecking applies
    /// immediately.
    pub fn toggle(&mut self, id: u64) -> Option<Cmd> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        if task.completed {
            task.completed = false;
            tracing::debug!(task = id, "task reopened");
            return None;
        }
        if !self.pending.insert(id) {
            return None;
        }

        let service = Arc::clone(&self.service);
        let list = self.id;
        Some(Box::pin(async move {
            let error = match tokio::task::spawn_blocking(move || service.complete(id)).await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(e.to_string()),
            };
            Some(Box::new(CompletionMsg {
                list,
                task_id: id,
                error,
            }) as Msg)
        }))
    }

    fn on_completion(&mut self, msg: &CompletionMsg) -> Option<Cmd> {
        self.pending.remove(&msg.task_id);
        if let Some(error) = &msg.error {
            tracing::warn!(task = msg.task_id, %error, "completing task failed");
            return Some(toast::show("Error completing task", Severity::Error));
        }
        let task = self.tasks.iter_mut().find(|t| t.id == msg.task_id)?;
        task.completed = true;
        tracing::info!(task = msg.task_id, progress = self.progress(), "task completed");
        Some(toast::show("Task completed!", Severity::Success))
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.visible().len();
        if len == 0 {
            self.cursor = 0;
        } else if down {
            self.cursor = (self.cursor + 1).min(len - 1);
        } else {
            self.cursor = self.cursor.saturating_sub(1);
        }
    }

    /// Handles keys, debounce timers and completion results.
    pub fn update(&mut self, msg: &Msg) -> Option<Cmd> {
        if let Some(done) = msg.downcast_ref::<CompletionMsg>() {
            if done.list != self.id {
                return None;
            }
            return self.on_completion(done);
        }

        if let Some(search) = msg.downcast_ref::<SearchMsg>() {
            if search.list == self.id && search.generation == self.generation {
                self.applied = self.query.clone();
                self.cursor = 0;
                tracing::debug!(query = %self.applied, "search applied");
            }
            return None;
        }

        let key_msg = msg.downcast_ref::<KeyMsg>()?;
        if self.searching {
            if self.keymap.done_searching.matches(key_msg) {
                self.blur();
                return None;
            }
            return match key_msg.key {
                KeyCode::Char(c)
                    if key_msg.modifiers.difference(KeyModifiers::SHIFT).is_empty() =>
                {
                    let mut query = self.query.clone();
                    query.push(c);
                    Some(self.set_query(query))
                }
                KeyCode::Backspace => {
                    let mut query = self.query.clone();
                    query.pop();
                    Some(self.set_query(query))
                }
                _ => None,
            };
        }

        if self.keymap.up.matches(key_msg) {
            self.move_cursor(false);
        } else if self.keymap.down.matches(key_msg) {
            self.move_cursor(true);
        } else if self.keymap.toggle.matches(key_msg) {
            let id = self.selected()?.id;
            return self.toggle(id);
        } else if self.keymap.search.matches(key_msg) {
            return self.focus();
        }
        None
    }

    /// Renders the search line, the tasks and the progress bar.
    pub fn view(&self) -> String {
        let muted = Style::new().foreground(self.theme.muted());
        let accent = Style::new().foreground(self.theme.primary()).bold(true);
        let mut lines = Vec::new();

        if self.searching || !self.query.is_empty() {
            let cursor = if self.searching { "▏" } else { "" };
            lines.push(format!("{} {}{}", accent.render("/"), self.query, cursor));
        }

        let visible = self.visible();
        if visible.is_empty() {
            lines.push(muted.render("No tasks found."));
        }
        for (i, task) in visible.iter().enumerate() {
            let marker = if i == self.cursor { "›" } else { " " };
            let check = if task.completed {
                "[x]"
            } else if self.pending.contains(&task.id) {
                "[…]"
            } else {
                "[ ]"
            };
            let title = if task.completed {
                muted.render(&task.title)
            } else {
                task.title.clone()
            };
            lines.push(format!(
                "{} {} {} {}",
                marker,
                check,
                title,
                muted.render(&format!("· {}", task.subject))
            ));
        }

        let pct = self.progress() as usize;
        let filled = pct * PROGRESS_CELLS / 100;
        lines.push(String::new());
        lines.push(format!(
            "{}{} {}%",
            accent.render(&"█".repeat(filled)),
            muted.render(&"░".repeat(PROGRESS_CELLS - filled)),
            pct
        ));
        lines.push(self.help.view(&self.keymap));
        lines.join("\n")
    }
}

impl Component for Model {
    fn focus(&mut self) -> Option<Cmd> {
        self.searching = true;
        None
    }

    fn blur(&mut self) {
        self.searching = false;
    }

    fn focused(&self) -> bool {
        self.searching
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchSettings;
    use std::sync::mpsc;

    fn tasks() -> Vec<Task> {
        vec![
            Task::new(1, "Read chapter 4", "Biology"),
            Task::new(2, "Problem set", "Calculus"),
            Task::new(3, "Flashcards", "Spanish"),
        ]
    }

    fn list_with(service: Arc<dyn TaskService>, mode: SearchMode) -> Model {
        let settings = SearchSettings {
            mode,
            ..SearchSettings::default()
        };
        Model::new(tasks(), service, &settings)
    }

    fn list() -> Model {
        list_with(Arc::new(InMemoryTaskService::new()), SearchMode::Substring)
    }

    fn press(code: KeyCode) -> Msg {
        Box::new(KeyMsg {
            key: code,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn apply_search(m: &mut Model) {
        let msg: Msg = Box::new(SearchMsg {
            list: m.id,
            generation: m.generation,
        });
        m.update(&msg);
    }

    #[test]
    fn test_search_matches_title_or_subject_case_insensitively() {
        let mut m = list();
        let _ = m.set_query("CALC");
        assert_eq!(m.visible().len(), 3);
        apply_search(&mut m);
        let ids: Vec<u64> = m.visible().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2]);

        let _ = m.set_query("chapter");
        apply_search(&mut m);
        assert_eq!(m.visible()[0].id, 1);
    }

    #[test]
    fn test_stale_debounce_is_ignored() {
        let mut m = list();
        let _ = m.set_query("bio");
        let stale: Msg = Box::new(SearchMsg {
            list: m.id,
            generation: m.generation,
        });
        let _ = m.set_query("spa");
        m.update(&stale);
        assert_eq!(m.applied_query(), "");
        apply_search(&mut m);
        assert_eq!(m.applied_query(), "spa");
        assert_eq!(m.visible()[0].id, 3);
    }

    #[test]
    fn test_fuzzy_mode() {
        let mut m = list_with(Arc::new(InMemoryTaskService::new()), SearchMode::Fuzzy);
        let _ = m.set_query("flcrd");
        apply_search(&mut m);
        let ids: Vec<u64> = m.visible().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn test_typing_in_search_mode() {
        let mut m = list();
        m.update(&press(KeyCode::Char('/')));
        assert!(m.focused());
        assert!(m.update(&press(KeyCode::Char('s'))).is_some());
        assert!(m.update(&press(KeyCode::Char('x'))).is_some());
        m.update(&press(KeyCode::Backspace));
        assert_eq!(m.query(), "s");
        m.update(&press(KeyCode::Esc));
        assert!(!m.focused());
    }

    #[tokio::test]
    async fn test_complete_success_marks_task_and_toasts() {
        let service = Arc::new(InMemoryTaskService::new());
        let mut m = list_with(service.clone(), SearchMode::Substring);
        let cmd = m.toggle(2).expect("service request");
        assert!(m.toggle(2).is_none(), "request already in flight");
        assert!(!m.tasks()[1].completed);

        let result = cmd.await.expect("completion message");
        let toast_cmd = m.update(&result).expect("toast");
        assert!(m.tasks()[1].completed);
        assert_eq!(m.progress(), 33);
        assert!(service.completed().contains(&2));

        let toast_msg = toast_cmd.await.expect("toast message");
        let show = toast_msg.downcast_ref::<toast::ShowMsg>().expect("show");
        assert_eq!(show.message, "Task completed!");
        assert_eq!(show.severity, Severity::Success);
    }

    #[tokio::test]
    async fn test_complete_failure_keeps_task_open() {
        let service = Arc::new(InMemoryTaskService::failing([1]));
        let mut m = list_with(service, SearchMode::Substring);
        let result = m.toggle(1).expect("request").await.expect("message");
        let toast_msg = m.update(&result).expect("toast").await.expect("message");
        assert!(!m.tasks()[0].completed);
        let show = toast_msg.downcast_ref::<toast::ShowMsg>().expect("show");
        assert_eq!(show.severity, Severity::Error);
        assert_eq!(show.message, "Error completing task");
    }

    #[tokio::test]
    async fn test_uncheck_is_local() {
        let service = Arc::new(InMemoryTaskService::new());
        let mut m = list_with(service.clone(), SearchMode::Substring);
        let result = m.toggle(3).expect("request").await.expect("message");
        m.update(&result);
        assert!(m.tasks()[2].completed);

        assert!(m.toggle(3).is_none());
        assert!(!m.tasks()[2].completed);
        assert_eq!(m.progress(), 0);
    }

    #[tokio::test]
    async fn test_progress_rounds_to_nearest() {
        let mut m = list();
        for id in [1, 2] {
            let result = m.toggle(id).expect("request").await.expect("message");
            m.update(&result);
        }
        assert_eq!(m.progress(), 67);
    }

    struct GatedService {
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl TaskService for GatedService {
        fn complete(&self, _id: u64) -> Result<()> {
            let gate = self.gate.lock().map_err(|e| Error::Task {
                task_id: 0,
                message: e.to_string(),
            })?;
            gate.recv().map_err(|e| Error::Task {
                task_id: 0,
                message: e.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_blocking_service_does_not_stall_runtime() {
        let (open, gate) = mpsc::channel();
        let service = Arc::new(GatedService {
            gate: Mutex::new(gate),
        });
        let mut m = list_with(service, SearchMode::Substring);
        let pending = tokio::spawn(m.toggle(1).expect("request"));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        open.send(()).unwrap();
        let result = pending.await.unwrap().expect("message");
        m.update(&result);
        assert!(m.tasks()[0].completed);
    }

    #[test]
    fn test_modified_chars_are_not_typed() {
        let mut m = list();
        m.update(&press(KeyCode::Char('/')));
        let ctrl_c: Msg = Box::new(KeyMsg {
            key: KeyCode::Char('c'),
            modifiers: KeyModifiers::CONTROL,
        });
        assert!(m.update(&ctrl_c).is_none());
        let shifted: Msg = Box::new(KeyMsg {
            key: KeyCode::Char('B'),
            modifiers: KeyModifiers::SHIFT,
        });
        assert!(m.update(&shifted).is_some());
        assert_eq!(m.query(), "B");
    }

    #[test]
    fn test_cursor_and_view() {
        let mut m = list();
        m.update(&press(KeyCode::Down));
        m.update(&press(KeyCode::Down));
        m.update(&press(KeyCode::Down));
        assert_eq!(m.selected().map(|t| t.id), Some(3));
        m.update(&press(KeyCode::Char('k')));
        assert_eq!(m.selected().map(|t| t.id), Some(2));

        let view = String::from_utf8(strip_ansi_escapes::strip(m.view())).unwrap();
        assert!(view.contains("› [ ] Problem set · Calculus"));
        assert!(view.contains(" 0%"));
    }

    #[test]
    fn test_empty_list_progress() {
        let m = Model::new(
            Vec::new(),
            Arc::new(InMemoryTaskService::new()),
            &SearchSettings::default(),
        );
        assert_eq!(m.progress(), 0);
        assert!(m.selected().is_none());
    }
}
