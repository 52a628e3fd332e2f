//! Chat input state
//!
//! Text buffer with a byte-offset cursor, a focus flag and a disabled flag.
//! The controller owns none of this; it reaches it through a [`SharedInput`]
//! handle to clear the text and restore focus after a response.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::commands::Command;

/// What applying a command to the input produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// The user asked to send this text
    Submit(String),
    /// Text or cursor changed
    Edited,
    /// Nothing happened (disabled input, or not an input command)
    Ignored,
}

#[derive(Debug, Clone)]
pub struct InputState {
    content: String,
    /// Cursor position (byte offset)
    cursor: usize,
    focused: bool,
    disabled: bool,
    placeholder: String,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            focused: true,
            disabled: false,
            placeholder: "write a message...".to_string(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// A disabled input loses focus and ignores edits
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
        if disabled {
            self.focused = false;
        }
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.len();
    }

    pub fn line_count(&self) -> usize {
        self.content.split('\n').count()
    }

    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.content.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn delete_char_before(&mut self) {
        if let Some((prev, _)) = self.content[..self.cursor].char_indices().last() {
            self.content.remove(prev);
            self.cursor = prev;
        }
    }

    pub fn delete_char_at(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    pub fn move_cursor_left(&mut self) {
        if let Some((prev, _)) = self.content[..self.cursor].char_indices().last() {
            self.cursor = prev;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if let Some(c) = self.content[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn move_cursor_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor = self.content.len();
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Apply an editing command
    ///
    /// `Submit` does not clear the text; the controller clears it once the
    /// reply has finished streaming.
    pub fn apply(&mut self, command: &Command) -> InputOutcome {
        if self.disabled {
            return InputOutcome::Ignored;
        }

        match command {
            Command::Submit => return InputOutcome::Submit(self.content.clone()),
            Command::InsertNewline => self.insert_newline(),
            Command::InsertChar(c) => self.insert_char(*c),
            Command::DeleteCharBefore => self.delete_char_before(),
            Command::DeleteCharAfter => self.delete_char_at(),
            Command::CursorLeft => self.move_cursor_left(),
            Command::CursorRight => self.move_cursor_right(),
            Command::CursorToStart => self.move_cursor_to_start(),
            Command::CursorToEnd => self.move_cursor_to_end(),
            Command::ClearInput => self.clear(),
            Command::Quit => return InputOutcome::Ignored,
        }
        InputOutcome::Edited
    }
}

/// Cloneable handle to one [`InputState`]
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    inner: Arc<RwLock<InputState>>,
}

impl SharedInput {
    pub fn new(state: InputState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, InputState> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, InputState> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> InputState {
        self.read_inner().clone()
    }

    pub fn content(&self) -> String {
        self.read_inner().content.clone()
    }

    pub fn is_focused(&self) -> bool {
        self.read_inner().focused
    }

    pub fn is_disabled(&self) -> bool {
        self.read_inner().disabled
    }

    pub fn apply(&self, command: &Command) -> InputOutcome {
        self.write_inner().apply(command)
    }

    pub fn set_content(&self, content: impl Into<String>) {
        self.write_inner().set_content(content);
    }

    /// Insert pasted text at the cursor; newlines are kept, nothing submits
    pub fn paste(&self, text: &str) -> InputOutcome {
        let mut inner = self.write_inner();
        if inner.disabled {
            return InputOutcome::Ignored;
        }
        inner.insert_str(&text.replace("\r\n", "\n"));
        InputOutcome::Edited
    }

    pub fn clear(&self) {
        self.write_inner().clear();
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.write_inner().set_disabled(disabled);
    }

    /// Give focus back to the input (no effect while disabled)
    pub fn focus(&self) {
        let mut inner = self.write_inner();
        if !inner.disabled {
            inner.focused = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_cursor() {
        let mut input = InputState::new();
        input.insert_str("Hello");
        input.insert_char('!');
        assert_eq!(input.content(), "Hello!");
        assert_eq!(input.cursor(), 6);
    }

    #[test]
    fn test_multibyte_cursor_movement() {
        let mut input = InputState::new();
        input.insert_str("añb");
        input.move_cursor_left();
        input.move_cursor_left();
        assert_eq!(input.cursor(), 1);
        input.delete_char_at();
        assert_eq!(input.content(), "ab");
        input.move_cursor_right();
        input.delete_char_before();
        assert_eq!(input.content(), "a");
        assert_eq!(input.cursor(), 1);
    }

    #[test]
    fn test_enter_submits_without_clearing() {
        let mut input = InputState::new();
        input.insert_str("hi");
        assert_eq!(
            input.apply(&Command::Submit),
            InputOutcome::Submit("hi".to_string())
        );
        assert_eq!(input.content(), "hi");
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut input = InputState::new();
        input.insert_str("line 1");
        assert_eq!(input.apply(&Command::InsertNewline), InputOutcome::Edited);
        input.insert_str("line 2");
        assert_eq!(input.content(), "line 1\nline 2");
        assert_eq!(input.line_count(), 2);
    }

    #[test]
    fn test_disabled_input_is_inert() {
        let mut input = InputState::new();
        input.insert_str("x");
        input.set_disabled(true);
        assert!(!input.is_focused());
        assert_eq!(input.apply(&Command::InsertChar('y')), InputOutcome::Ignored);
        assert_eq!(input.apply(&Command::Submit), InputOutcome::Ignored);
        assert_eq!(input.content(), "x");
    }

    #[test]
    fn test_shared_focus_respects_disabled() {
        let shared = SharedInput::default();
        shared.set_disabled(true);
        shared.focus();
        assert!(!shared.is_focused());
        shared.set_disabled(false);
        shared.focus();
        assert!(shared.is_focused());
    }

    #[test]
    fn test_paste_keeps_newlines_and_respects_disabled() {
        let shared = SharedInput::default();
        assert_eq!(shared.paste("a\r\nb"), InputOutcome::Edited);
        assert_eq!(shared.content(), "a\nb");

        shared.set_disabled(true);
        assert_eq!(shared.paste("c"), InputOutcome::Ignored);
        assert_eq!(shared.content(), "a\nb");
    }
}
