//! Terminal user interface for streamchat
//!
//! A ratatui/crossterm front-end over the chat controller: message list,
//! toast strip and input box.

pub mod app;
mod events;
pub mod widgets;

pub use app::{draw, TuiApp};
pub use events::{Event, EventHandler};
