//! Key mapping from terminal events to host actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Keyboard-driven actions of a terminal host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    /// Abort the current drag
    CancelDrag,
    /// Run a named setup command
    RunCommand(&'static str),
}

/// Map keyboard input to host actions.
pub fn handle_key_event(key: KeyEvent) -> Option<HostAction> {
    match key.code {
        KeyCode::Esc => Some(HostAction::CancelDrag),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(HostAction::RunCommand("createGrid")),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(HostAction::RunCommand("clearGrid")),
        KeyCode::Char('n') | KeyCode::Char('N') => {
            Some(HostAction::RunCommand("randomizeColors"))
        }
        _ => None,
    }
}

/// Check if key should quit the game.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
