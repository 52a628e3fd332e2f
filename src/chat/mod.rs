//! Chat client core: message store, input, and the send-and-stream controller

pub mod commands;
pub mod controller;
pub mod decoder;
pub mod input;
pub mod message;
pub mod providers;
pub mod store;
pub mod toast;
pub mod transport;

pub use commands::{key_to_command, Command};
pub use controller::{ChatController, SendError, SendOutcome, SendPhase, SEND_FAILED_TOAST};
pub use decoder::TextStreamDecoder;
pub use input::{InputOutcome, InputState, SharedInput};
pub use message::{Message, MessageRequest};
pub use providers::Providers;
pub use store::{MessageStore, StoreError};
pub use toast::{Toast, ToastLevel, Toaster};
pub use transport::{ByteStream, MessageTransport, TransportError};
