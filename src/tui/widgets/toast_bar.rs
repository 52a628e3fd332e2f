//! Single-line strip between messages and input
//!
//! Shows the newest active toast, or a key hint when there is none.

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    widgets::{Paragraph, Widget},
};

use crate::chat::{Toast, ToastLevel};

const KEY_HINT: &str = "Enter send · Shift+Enter newline · Esc clear · Ctrl+C quit";

pub struct ToastBar<'a> {
    toast: Option<&'a Toast>,
}

impl<'a> ToastBar<'a> {
    /// Bar showing the last of `toasts`
    pub fn new(toasts: &'a [Toast]) -> Self {
        Self {
            toast: toasts.last(),
        }
    }

    fn style(&self) -> Style {
        match self.toast.map(|t| t.level) {
            Some(ToastLevel::Error) => Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD),
            Some(ToastLevel::Info) => Style::default().fg(Color::Yellow),
            None => Style::default().fg(Color::DarkGray),
        }
    }
}

impl Widget for ToastBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let text = match self.toast {
            Some(toast) => format!("● {}", toast.message),
            None => KEY_HINT.to_string(),
        };
        Paragraph::new(text)
            .style(self.style())
            .alignment(Alignment::Center)
            .render(area, buf);
    }
}
