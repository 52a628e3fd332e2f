//! UI widgets for the terminal chat

mod input;
mod message_list;
mod toast_bar;

pub use input::{input_height, InputRenderer, MAX_INPUT_LINES, SPINNER_FRAMES};
pub use message_list::{wrap_line, MessageListWidget};
pub use toast_bar::ToastBar;
