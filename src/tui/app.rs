use std::collections::VecDeque;

use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::environment::Environment;
use crate::status::GameInfo;

const MAX_MESSAGES: usize = 200;

/// A menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start(Environment),
    Stop(Environment),
    Restart(Environment),
    Status,
    Logs(Environment),
    ChromeStart,
    ChromeStop,
    ChromeStatus,
    Profiles,
    Build(Environment),
    Clean,
    Quit,
}

pub const MENU: [Action; 16] = [
    Action::Start(Environment::Development),
    Action::Start(Environment::Production),
    Action::Stop(Environment::Development),
    Action::Stop(Environment::Production),
    Action::Restart(Environment::Development),
    Action::Restart(Environment::Production),
    Action::Status,
    Action::Logs(Environment::Development),
    Action::Logs(Environment::Production),
    Action::ChromeStart,
    Action::ChromeStop,
    Action::ChromeStatus,
    Action::Profiles,
    Action::Build(Environment::Development),
    Action::Build(Environment::Production),
    Action::Clean,
];

impl Action {
    pub fn label(&self) -> String {
        match self {
            Action::Start(env) => format!("Start {}", env.as_str()),
            Action::Stop(env) => format!("Stop {}", env.as_str()),
            Action::Restart(env) => format!("Restart {}", env.as_str()),
            Action::Status => "Refresh status".to_string(),
            Action::Logs(env) => format!("Show {} logs", env.as_str()),
            Action::ChromeStart => "Start Chrome".to_string(),
            Action::ChromeStop => "Stop Chrome".to_string(),
            Action::ChromeStatus => "Chrome status".to_string(),
            Action::Profiles => "List Chrome profiles".to_string(),
            Action::Build(env) => format!("Build {} image", env.as_str()),
            Action::Clean => "Clean everything".to_string(),
            Action::Quit => "Quit".to_string(),
        }
    }

    /// Actions that destroy state ask for a `y` first.
    pub fn needs_confirmation(&self) -> bool {
        matches!(self, Action::Clean)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

/// What the status poller last published.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub games: Vec<GameInfo>,
    pub debugger_available: bool,
    pub taken_at: DateTime<Local>,
}

/// UI state. Owned by the UI task; the poller only ever hands it snapshots.
#[derive(Debug, Default)]
pub struct App {
    pub selected: usize,
    pub messages: VecDeque<Message>,
    pub snapshot: Option<Snapshot>,
    /// Action waiting for a `y` before it runs.
    pub pending: Option<Action>,
    /// Set while an action runs; shown in the footer.
    pub busy: Option<String>,
}

impl App {
    pub fn new() -> Self {
        let mut app = Self::default();
        app.push(Message::info(
            "Up/Down to move, Enter to run, r to refresh, q to quit",
        ));
        app
    }

    pub fn selected_action(&self) -> Action {
        MENU[self.selected]
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > MAX_MESSAGES {
            self.messages.pop_front();
        }
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = Message>) {
        for m in messages {
            self.push(m);
        }
    }

    /// Translate a key press into the action to run, if any.
    pub fn on_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        if let Some(action) = self.pending.take() {
            return match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => Some(action),
                _ => {
                    self.push(Message::info(format!("{}: cancelled", action.label())));
                    None
                }
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('r') => Some(Action::Status),
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.checked_sub(1).unwrap_or(MENU.len() - 1);
                None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = (self.selected + 1) % MENU.len();
                None
            }
            KeyCode::Enter => {
                let action = self.selected_action();
                if action.needs_confirmation() {
                    self.push(Message::info(format!(
                        "{}: press y to confirm, any other key to cancel",
                        action.label()
                    )));
                    self.pending = Some(action);
                    None
                } else {
                    Some(action)
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn navigation_wraps() {
        let mut app = App::new();
        assert_eq!(app.on_key(press(KeyCode::Up)), None);
        assert_eq!(app.selected, MENU.len() - 1);
        assert_eq!(app.on_key(press(KeyCode::Down)), None);
        assert_eq!(app.selected, 0);
        assert_eq!(
            app.on_key(press(KeyCode::Enter)),
            Some(Action::Start(Environment::Development))
        );
    }

    #[test]
    fn clean_requires_confirmation() {
        let mut app = App::new();
        app.selected = MENU.iter().position(|a| *a == Action::Clean).unwrap();

        assert_eq!(app.on_key(press(KeyCode::Enter)), None);
        assert_eq!(app.pending, Some(Action::Clean));
        assert_eq!(app.on_key(press(KeyCode::Char('n'))), None);
        assert_eq!(app.pending, None);
        assert!(app.messages.back().unwrap().text.ends_with("cancelled"));

        app.on_key(press(KeyCode::Enter));
        assert_eq!(app.on_key(press(KeyCode::Char('y'))), Some(Action::Clean));
    }

    #[test]
    fn quit_keys() {
        let mut app = App::new();
        assert_eq!(app.on_key(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(
            app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(app.on_key(press(KeyCode::Char('r'))), Some(Action::Status));
    }

    #[test]
    fn message_history_is_bounded() {
        let mut app = App::new();
        app.extend((0..MAX_MESSAGES + 10).map(|i| Message::info(i.to_string())));
        assert_eq!(app.messages.len(), MAX_MESSAGES);
        assert_eq!(app.messages.back().unwrap().text, (MAX_MESSAGES + 9).to_string());
    }
}
