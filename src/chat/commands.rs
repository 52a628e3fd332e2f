//! Keyboard to command mapping for the chat input

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    /// Submit the current input (Enter)
    Submit,
    /// Insert a literal newline (Shift+Enter)
    InsertNewline,
    InsertChar(char),
    DeleteCharBefore,
    DeleteCharAfter,
    CursorLeft,
    CursorRight,
    CursorToStart,
    CursorToEnd,
    ClearInput,
}

/// Convert keyboard events to commands
pub fn key_to_command(key: KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL)
        | (KeyCode::Char('q'), KeyModifiers::CONTROL) => Some(Command::Quit),

        // Some terminals only report Alt+Enter, treat it like Shift+Enter
        (KeyCode::Enter, m) if m.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) => {
            Some(Command::InsertNewline)
        }
        (KeyCode::Enter, KeyModifiers::NONE) => Some(Command::Submit),

        (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
            Some(Command::InsertChar(c))
        }
        (KeyCode::Backspace, _) => Some(Command::DeleteCharBefore),
        (KeyCode::Delete, _) => Some(Command::DeleteCharAfter),
        (KeyCode::Left, _) => Some(Command::CursorLeft),
        (KeyCode::Right, _) => Some(Command::CursorRight),
        (KeyCode::Home, _) => Some(Command::CursorToStart),
        (KeyCode::End, _) => Some(Command::CursorToEnd),
        (KeyCode::Esc, _) => Some(Command::ClearInput),

        _ => None,
    }
}
