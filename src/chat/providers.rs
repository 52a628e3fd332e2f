//! Root-owned shared state
//!
//! [`Providers`] is built once where the UI starts and handed by reference to
//! everything that needs the HTTP client, the message store or the toasts.
//! Nothing here is global.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use super::controller::ChatController;
use super::input::{InputState, SharedInput};
use super::store::MessageStore;
use super::toast::Toaster;
use crate::config::ClientConfig;
use crate::transport::client::HttpTransport;

#[derive(Debug, Clone)]
pub struct Providers {
    http: reqwest::Client,
    store: MessageStore,
    toaster: Toaster,
}

impl Providers {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("streamchat/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(http))
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self {
            http,
            store: MessageStore::new(),
            toaster: Toaster::new(),
        }
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn toaster(&self) -> &Toaster {
        &self.toaster
    }

    /// Build the chat input controller wired to this root's state
    pub fn chat_controller(&self, config: &ClientConfig) -> ChatController {
        let transport = HttpTransport::new(self.http.clone(), config.endpoint.clone());
        ChatController::new(
            self.store.clone(),
            SharedInput::new(InputState::new()),
            self.toaster.clone(),
            Arc::new(transport),
        )
        .with_focus_delay(Duration::from_millis(config.focus_delay_ms))
    }
}
