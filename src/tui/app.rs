//! Terminal chat application
//!
//! Owns the terminal and the event loop. All chat state lives behind the
//! [`ChatController`]; the loop only turns key presses into commands and
//! redraws from the shared store every tick.

use std::io::{self, Stdout};

use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

use super::events::{Event, EventHandler};
use super::widgets::{input_height, InputRenderer, MessageListWidget, ToastBar};
use crate::chat::{key_to_command, ChatController, Command};

/// Draw one frame of the chat screen
pub fn draw(frame: &mut Frame, controller: &ChatController, spinner_frame: usize) {
    let input = controller.input().snapshot();
    let toasts = controller.toaster().active();
    let streaming = controller.store().is_message_updating();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(input_height(&input)),
        ])
        .split(frame.area());

    controller.store().read_messages(|messages| {
        frame.render_widget(
            MessageListWidget::new(messages).streaming(streaming),
            chunks[0],
        );
    });
    frame.render_widget(ToastBar::new(&toasts), chunks[1]);

    let renderer = InputRenderer::new(&input);
    let renderer = if controller.is_loading() {
        renderer.loading(spinner_frame)
    } else {
        renderer
    };
    frame.render_widget(renderer, chunks[2]);
}

pub struct TuiApp {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    events: EventHandler,
    controller: ChatController,
    spinner_frame: usize,
    should_quit: bool,
}

impl TuiApp {
    pub fn new(controller: ChatController) -> anyhow::Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            events: EventHandler::new(),
            controller,
            spinner_frame: 0,
            should_quit: false,
        })
    }

    /// Set up the terminal for TUI rendering
    fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore the terminal to its original state
    fn restore_terminal(&mut self) -> anyhow::Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    /// Run until the user quits; the terminal is restored even on error
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let result = self.event_loop();
        if let Err(e) = self.restore_terminal() {
            tracing::error!("Failed to restore terminal: {}", e);
        }
        result
    }

    fn event_loop(&mut self) -> anyhow::Result<()> {
        while !self.should_quit {
            self.render()?;
            let event = self.events.poll()?;
            self.handle_event(event);
        }
        Ok(())
    }

    fn render(&mut self) -> anyhow::Result<()> {
        if self.controller.is_loading() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
        let controller = &self.controller;
        let spinner_frame = self.spinner_frame;
        self.terminal
            .draw(|frame| draw(frame, controller, spinner_frame))?;
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                let Some(command) = key_to_command(key) else {
                    return;
                };
                if command == Command::Quit {
                    self.should_quit = true;
                    return;
                }
                // The spawned send task reports through the store and toasts
                let _ = self.controller.handle_command(&command);
            }
            Event::Paste(text) => {
                self.controller.input().paste(&text);
            }
            Event::Resize(_, _) | Event::Tick => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{
        ByteStream, InputState, Message, MessageRequest, MessageStore, MessageTransport,
        SharedInput, Toaster, TransportError,
    };
    use async_trait::async_trait;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    struct Unreachable;

    #[async_trait]
    impl MessageTransport for Unreachable {
        async fn send(&self, _: &MessageRequest) -> Result<Option<ByteStream>, TransportError> {
            Err(TransportError::Network("offline".into()))
        }
    }

    fn controller() -> ChatController {
        ChatController::new(
            MessageStore::new(),
            SharedInput::new(InputState::new()),
            Toaster::new(),
            Arc::new(Unreachable),
        )
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_draw_shows_messages_and_input() {
        let controller = controller();
        controller
            .store()
            .add_message(Message::assistant("welcome back"))
            .unwrap();
        controller.input().set_content("draft");

        let mut terminal = Terminal::new(TestBackend::new(40, 12)).unwrap();
        terminal.draw(|f| draw(f, &controller, 0)).unwrap();

        let out = screen(&terminal);
        assert!(out.contains("welcome back"));
        assert!(out.contains("draft"));
        assert!(out.contains("Message"));
    }

    #[tokio::test]
    async fn test_failed_send_shows_toast() {
        let controller = controller();
        controller.input().set_content("hello");
        let handle = controller.handle_command(&Command::Submit).unwrap();
        let _ = handle.await.unwrap();

        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        terminal.draw(|f| draw(f, &controller, 0)).unwrap();

        let out = screen(&terminal);
        assert!(out.contains("Something went wrong. Please try again."));
        assert!(out.contains("hello"));
    }
}
