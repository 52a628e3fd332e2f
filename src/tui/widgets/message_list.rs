//! Message list widget
//!
//! Renders the store's messages oldest first, wrapped to the area width and
//! anchored to the bottom so the streaming reply stays in view.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthChar;

use crate::chat::Message;

/// Split `text` into rows no wider than `width` display columns
pub fn wrap_line(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }

    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if row_width + w > width && !row.is_empty() {
            rows.push(std::mem::take(&mut row));
            row_width = 0;
        }
        row.push(c);
        row_width += w;
    }
    rows.push(row);
    rows
}

pub struct MessageListWidget<'a> {
    messages: &'a [Message],
    /// Whether the last assistant message is still streaming
    streaming: bool,
}

impl<'a> MessageListWidget<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            messages,
            streaming: false,
        }
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let last = self.messages.len().saturating_sub(1);

        for (i, message) in self.messages.iter().enumerate() {
            let (label, label_style, text_style) = if message.is_user_message {
                (
                    "you",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                    Style::default(),
                )
            } else {
                (
                    "assistant",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                    Style::default().fg(Color::Gray),
                )
            };

            let mut header = vec![Span::styled(label, label_style)];
            if self.streaming && i == last && !message.is_user_message {
                header.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
            }
            lines.push(Line::from(header));

            for source_line in message.text.split('\n') {
                for row in wrap_line(source_line, width) {
                    lines.push(Line::from(Span::styled(row, text_style)));
                }
            }
            lines.push(Line::default());
        }
        lines
    }
}

impl Widget for MessageListWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let lines = self.lines(area.width as usize);
        let overflow = lines.len().saturating_sub(area.height as usize);
        let scroll = u16::try_from(overflow).unwrap_or(u16::MAX);
        Paragraph::new(lines).scroll((scroll, 0)).render(area, buf);
    }
}
