//! Shared message store
//!
//! Ordered list of messages plus the store-wide "message is updating" flag.
//! Cloning a [`MessageStore`] clones the handle, not the messages, so the
//! root can hand the same store to the controller and every display widget.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use super::message::Message;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Message id already present: {0}")]
    DuplicateId(String),

    #[error("Message not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct MessageStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    messages: Vec<Message>,
    is_message_updating: bool,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with messages (ids must be unique)
    pub fn with_messages(messages: Vec<Message>) -> Result<Self, StoreError> {
        let store = Self::new();
        for message in messages {
            store.add_message(message)?;
        }
        Ok(store)
    }

    fn read_inner(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().unwrap_or_else(|poisoned| {
            tracing::warn!("MessageStore read lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write_inner(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().unwrap_or_else(|poisoned| {
            tracing::warn!("MessageStore write lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Append a message at the end of the list
    pub fn add_message(&self, message: Message) -> Result<(), StoreError> {
        let mut inner = self.write_inner();
        if inner.messages.iter().any(|m| m.id == message.id) {
            return Err(StoreError::DuplicateId(message.id));
        }
        inner.messages.push(message);
        Ok(())
    }

    /// Replace a message's text with `f(previous_text)`
    ///
    /// Only the entry with the given id is touched; ordering of the list is
    /// unchanged.
    pub fn update_message<F>(&self, id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&str) -> String,
    {
        let mut inner = self.write_inner();
        let message = inner
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        message.text = f(&message.text);
        Ok(())
    }

    /// Remove a message by id, returning it if it existed
    pub fn remove_message(&self, id: &str) -> Option<Message> {
        let mut inner = self.write_inner();
        let index = inner.messages.iter().position(|m| m.id == id)?;
        Some(inner.messages.remove(index))
    }

    pub fn messages(&self) -> Vec<Message> {
        self.read_inner().messages.clone()
    }

    /// Access messages without cloning (used for rendering)
    pub fn read_messages<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&[Message]) -> R,
    {
        let inner = self.read_inner();
        f(&inner.messages)
    }

    pub fn get(&self, id: &str) -> Option<Message> {
        self.read_inner()
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.read_inner().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_inner().messages.is_empty()
    }

    pub fn is_message_updating(&self) -> bool {
        self.read_inner().is_message_updating
    }

    pub fn set_is_message_updating(&self, updating: bool) {
        self.write_inner().is_message_updating = updating;
    }
}
