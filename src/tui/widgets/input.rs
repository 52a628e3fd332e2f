//! Input box renderer

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::chat::InputState;

/// Braille spinner shown in the input title while a reply is loading
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Most lines the input box grows to
pub const MAX_INPUT_LINES: u16 = 6;

/// Rows needed to draw `input`, borders included
pub fn input_height(input: &InputState) -> u16 {
    (input.line_count() as u16).clamp(1, MAX_INPUT_LINES) + 2
}

pub struct InputRenderer<'a> {
    input: &'a InputState,
    spinner_frame: Option<usize>,
}

impl<'a> InputRenderer<'a> {
    pub fn new(input: &'a InputState) -> Self {
        Self {
            input,
            spinner_frame: None,
        }
    }

    /// Show the loading spinner at `frame`
    pub fn loading(mut self, frame: usize) -> Self {
        self.spinner_frame = Some(frame);
        self
    }

    fn title(&self) -> Line<'static> {
        match self.spinner_frame {
            Some(frame) => Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    SPINNER_FRAMES[frame % SPINNER_FRAMES.len()],
                    Style::default().fg(Color::Cyan),
                ),
                Span::raw(" "),
            ]),
            None => Line::from(" Message "),
        }
    }

    /// Content split into lines, with the cursor cell highlighted when focused
    fn content_lines(&self) -> Vec<Line<'a>> {
        let content = self.input.content();
        let text_style = if self.input.is_disabled() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };
        let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
        let show_cursor = self.input.is_focused() && !self.input.is_disabled();
        let cursor = self.input.cursor();

        let mut lines = Vec::new();
        let mut start = 0;
        for segment in content.split('\n') {
            let end = start + segment.len();
            let mut spans = Vec::new();

            if show_cursor && (start..=end).contains(&cursor) {
                let local = cursor - start;
                let (before, rest) = segment.split_at(local);
                let mut rest_chars = rest.chars();
                let at = rest_chars.next();
                if !before.is_empty() {
                    spans.push(Span::styled(before, text_style));
                }
                match at {
                    Some(c) => {
                        let width = c.len_utf8();
                        spans.push(Span::styled(&rest[..width], cursor_style));
                        spans.push(Span::styled(&rest[width..], text_style));
                    }
                    None => spans.push(Span::styled(" ", cursor_style)),
                }
            } else {
                spans.push(Span::styled(segment, text_style));
            }

            lines.push(Line::from(spans));
            start = end + 1;
        }
        lines
    }
}

impl Widget for InputRenderer<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.input.is_focused() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(self.title());
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.input.is_empty() && !self.input.is_focused() {
            Paragraph::new(self.input.placeholder())
                .style(Style::default().fg(Color::DarkGray))
                .render(inner, buf);
            return;
        }

        let lines = self.content_lines();
        let cursor_line = self.input.content()[..self.input.cursor()]
            .matches('\n')
            .count() as u16;
        let scroll = cursor_line.saturating_sub(inner.height.saturating_sub(1));
        Paragraph::new(lines).scroll((scroll, 0)).render(inner, buf);
    }
}
