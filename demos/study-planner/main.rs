//! Study planner dashboard: task list, quick actions, theme toggle and the
//! Pomodoro modal.
//!
//! Settings are read from `STUDY_PLANNER_CONFIG` (default
//! `study-planner.toml`). Logs go to `study-planner.log`, filtered by
//! `RUST_LOG`.

use bubbletea_rs::{Cmd, KeyMsg, Model, Msg, Program};
use lipgloss_extras::prelude::*;
use std::fs::File;
use std::sync::{Arc, Mutex};
use study_planner_widgets::notify::BellNotifier;
use study_planner_widgets::prelude::*;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "STUDY_PLANNER_CONFIG";
const DEFAULT_CONFIG: &str = "study-planner.toml";
const LOG_FILE: &str = "study-planner.log";

struct AppKeys {
    force_quit: Binding,
    quit: Binding,
    theme: Binding,
    add_task: Binding,
    add_exam: Binding,
    pomodoro: Binding,
    calendar: Binding,
    subjects: Binding,
}

impl Default for AppKeys {
    fn default() -> Self {
        Self {
            force_quit: new_binding(vec![with_keys_str(&["ctrl+c"])]).with_help("ctrl+c", "quit"),
            quit: new_binding(vec![with_keys_str(&["q"])]).with_help("q", "quit"),
            theme: new_binding(vec![with_keys_str(&["t"])]).with_help("t", "theme"),
            add_task: new_binding(vec![with_keys_str(&["n"])]).with_help("n", "new task"),
            add_exam: new_binding(vec![with_keys_str(&["e"])]).with_help("e", "new exam"),
            pomodoro: new_binding(vec![with_keys_str(&["p"])]).with_help("p", "pomodoro"),
            calendar: new_binding(vec![with_keys_str(&["c"])]).with_help("c", "calendar"),
            subjects: new_binding(vec![with_keys_str(&["m"])]).with_help("m", "subjects"),
        }
    }
}

impl KeyMap for AppKeys {
    fn short_help(&self) -> Vec<&Binding> {
        vec![
            &self.add_task,
            &self.add_exam,
            &self.pomodoro,
            &self.calendar,
            &self.subjects,
            &self.theme,
            &self.quit,
        ]
    }

    fn full_help(&self) -> Vec<Vec<&Binding>> {
        vec![
            vec![&self.add_task, &self.add_exam],
            vec![&self.pomodoro, &self.calendar, &self.subjects],
            vec![&self.theme, &self.quit],
        ]
    }
}

struct App {
    ctx: AppContext,
    tasks: TaskList,
    toasts: Toasts,
    pomodoro: Option<Pomodoro>,
    location: &'static str,
    keys: AppKeys,
    help: HelpModel,
}

fn load_context() -> AppContext {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG.to_string());
    let settings = match Settings::load(&path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(error = %e, path = %path, "using default settings");
            Settings::default()
        }
    };

    // A terminal has no permission dialog; running the app is consent.
    let mut prompt = || Permission::Granted;
    match AppContext::load(settings, BellNotifier, Permission::Default, &mut prompt) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "falling back to in-memory context");
            AppContext::in_memory()
        }
    }
}

fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new(1, "Read chapter 4", "Biology"),
        Task::new(2, "Problem set 7", "Calculus"),
        Task::new(3, "Essay outline", "History"),
        Task::new(4, "Flashcards: irregular verbs", "Spanish"),
        Task::new(5, "Lab report draft", "Chemistry"),
    ]
}

impl App {
    fn apply_theme(&mut self) {
        let theme = self.ctx.theme.current();
        self.tasks.theme = theme;
        self.toasts.theme = theme;
    }

    fn toggle_theme(&mut self) -> Option<Cmd> {
        let result = self.ctx.theme.toggle();
        self.apply_theme();
        match result {
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, "could not save theme");
                Some(self.toasts.push("Could not save theme", Severity::Error))
            }
        }
    }

    fn run_action(&mut self, action: QuickAction) -> Option<Cmd> {
        match action.outcome() {
            Outcome::Navigate(path) => {
                self.location = path;
                Some(self.toasts.push(format!("Opening {path}"), Severity::Info))
            }
            Outcome::OpenPomodoro => {
                if self.pomodoro.is_none() {
                    self.tasks.blur();
                    self.pomodoro = Some(Pomodoro::new(&self.ctx));
                }
                None
            }
        }
    }

    fn handle_key(&mut self, key_msg: &KeyMsg, msg: &Msg) -> Option<Cmd> {
        if self.tasks.focused() {
            return self.tasks.update(msg);
        }

        if self.keys.quit.matches(key_msg) {
            return Some(bubbletea_rs::quit());
        }
        if self.keys.theme.matches(key_msg) {
            return self.toggle_theme();
        }

        let action = [
            (&self.keys.add_task, QuickAction::AddTask),
            (&self.keys.add_exam, QuickAction::AddExam),
            (&self.keys.pomodoro, QuickAction::StartPomodoro),
            (&self.keys.calendar, QuickAction::ViewCalendar),
            (&self.keys.subjects, QuickAction::ManageSubjects),
        ]
        .into_iter()
        .find(|(binding, _)| binding.matches(key_msg))
        .map(|(_, action)| action);

        match action {
            Some(action) => self.run_action(action),
            None => self.tasks.update(msg),
        }
    }

    fn header(&self) -> String {
        let theme = self.ctx.theme.current();
        let title = Style::new()
            .foreground(theme.primary())
            .bold(true)
            .render("AI Study Planner");
        let meta = Style::new()
            .foreground(theme.muted())
            .render(&format!("{}  {}", theme.icon(), self.location));
        format!("{title}  {meta}")
    }
}

impl Model for App {
    fn init() -> (Self, Option<Cmd>) {
        let ctx = load_context();
        let service = Arc::new(InMemoryTaskService::new());
        let tasks = TaskList::new(sample_tasks(), service, &ctx.settings.search);
        let toasts = Toasts::new(&ctx.settings.toast);
        let mut app = App {
            ctx,
            tasks,
            toasts,
            pomodoro: None,
            location: "/dashboard",
            keys: AppKeys::default(),
            help: HelpModel::new(),
        };
        app.apply_theme();
        (app, None)
    }

    fn update(&mut self, msg: Msg) -> Option<Cmd> {
        let key_msg = msg.downcast_ref::<KeyMsg>();
        if key_msg.is_some_and(|k| self.keys.force_quit.matches(k)) {
            return Some(bubbletea_rs::quit());
        }

        // Keys reach the toast stack only from the dashboard itself.
        let typing = self.pomodoro.is_some() || self.tasks.focused();
        if key_msg.is_none() || !typing {
            if let Some(cmd) = self.toasts.update(&msg) {
                return Some(cmd);
            }
        }

        if let Some(pomodoro) = self.pomodoro.as_mut() {
            let cmd = pomodoro.update(&msg);
            if !pomodoro.is_open() {
                self.pomodoro = None;
            }
            // The modal captures the keyboard while it is open.
            if key_msg.is_some() || cmd.is_some() {
                return cmd;
            }
        }

        match key_msg {
            Some(key_msg) => self.handle_key(key_msg, &msg),
            None => self.tasks.update(&msg),
        }
    }

    fn view(&self) -> String {
        let mut sections = vec![self.header(), String::new(), self.tasks.view()];
        if let Some(pomodoro) = &self.pomodoro {
            sections.push(String::new());
            sections.push(pomodoro.view());
        }
        let toasts = self.toasts.view();
        if !toasts.is_empty() {
            sections.push(String::new());
            sections.push(toasts);
        }
        if self.pomodoro.is_none() {
            sections.push(String::new());
            sections.push(self.help.view(&self.keys));
        }
        sections.join("\n")
    }
}

fn init_logging() -> anyhow::Result<()> {
    let file = File::create(LOG_FILE)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("study_planner_widgets=info,study_planner=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    tracing::info!("starting study planner");

    let program = Program::<App>::builder()
        .alt_screen(true)
        .signal_handler(true)
        .build()?;
    program.run().await?;

    tracing::info!("study planner closed");
    Ok(())
}
