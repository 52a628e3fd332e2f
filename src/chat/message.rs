//! Chat message record

use serde::{Deserialize, Serialize};

/// A single chat message.
///
/// Serialized with camelCase keys so the wire format is
/// `{"id", "isUserMessage", "text"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub is_user_message: bool,
    pub text: String,
}

impl Message {
    /// Create a user-authored message with a fresh id
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            is_user_message: true,
            text: text.into(),
        }
    }

    /// Create an empty assistant message to be filled while streaming
    pub fn placeholder() -> Self {
        Self {
            id: new_message_id(),
            is_user_message: false,
            text: String::new(),
        }
    }

    /// Create an assistant message with known text
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            is_user_message: false,
            text: text.into(),
        }
    }
}

/// Generate a fresh message id
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Request body for the message submission route
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub messages: Vec<Message>,
}

impl MessageRequest {
    pub fn single(message: Message) -> Self {
        Self {
            messages: vec![message],
        }
    }
}
