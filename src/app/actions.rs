use crossterm::event::KeyCode;
use std::fmt;

/// Logical studio commands, independent of the key that produced them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioAction {
    Next,
    Previous,
    Last,
    /// Start an export, or cancel the running one
    Export,
    Help,
    Quit,
}

impl StudioAction {
    pub const ALL: [StudioAction; 6] = [
        StudioAction::Next,
        StudioAction::Previous,
        StudioAction::Last,
        StudioAction::Export,
        StudioAction::Help,
        StudioAction::Quit,
    ];

    /// Map a key to an action; `None` for unbound keys
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Right => Some(StudioAction::Next),
            KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Left => Some(StudioAction::Previous),
            KeyCode::Char('m') | KeyCode::Char('M') => Some(StudioAction::Last),
            KeyCode::Char('c') | KeyCode::Char('C') => Some(StudioAction::Export),
            KeyCode::Char('h') | KeyCode::Char('H') => Some(StudioAction::Help),
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(StudioAction::Quit),
            _ => None,
        }
    }

    pub fn keys(&self) -> &'static str {
        match self {
            StudioAction::Next => "N / Right",
            StudioAction::Previous => "B / Left",
            StudioAction::Last => "M",
            StudioAction::Export => "C",
            StudioAction::Help => "H",
            StudioAction::Quit => "Q / Esc",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            StudioAction::Next => "next sample",
            StudioAction::Previous => "previous sample",
            StudioAction::Last => "last sample",
            StudioAction::Export => "export video (press again to cancel)",
            StudioAction::Help => "show this help",
            StudioAction::Quit => "quit",
        }
    }
}

impl fmt::Display for StudioAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// One line per shortcut
pub fn help_text() -> String {
    let mut text = String::from("Shortcuts:");
    for action in StudioAction::ALL {
        text.push_str(&format!("\n\t{:<10} {}", action.keys(), action.description()));
    }
    text
}
