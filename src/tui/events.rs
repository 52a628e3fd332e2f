//! Event handling for the TUI
//!
//! Wraps crossterm's blocking poll/read.

use std::time::Duration;

use crossterm::event::{self, KeyEvent};

/// Events that can occur in the TUI
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed
    Key(KeyEvent),
    /// Terminal was resized
    Resize(u16, u16),
    /// Paste event (bracketed paste)
    Paste(String),
    /// Nothing happened within the poll timeout
    Tick,
}

/// Handles events from the terminal
#[derive(Debug)]
pub struct EventHandler {
    tick_rate: Duration,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    /// Create a new event handler with the default tick rate (50ms)
    pub fn new() -> Self {
        Self {
            tick_rate: Duration::from_millis(50),
        }
    }

    /// Wait up to one tick for the next event
    pub fn poll(&self) -> anyhow::Result<Event> {
        if event::poll(self.tick_rate)? {
            Ok(convert_event(event::read()?))
        } else {
            Ok(Event::Tick)
        }
    }
}

fn convert_event(event: event::Event) -> Event {
    match event {
        event::Event::Key(key) => Event::Key(key),
        event::Event::Resize(cols, rows) => Event::Resize(cols, rows),
        event::Event::Paste(text) => Event::Paste(text),
        // Mouse, FocusGained and FocusLost are treated as ticks
        _ => Event::Tick,
    }
}
