//! streamchat: a minimal streaming chat
//!
//! This library provides:
//! - A chat client core: message store, input state and the controller that
//!   sends a message and streams the reply into the store
//! - An HTTP server exposing `POST /api/message`, guarded by a per-client
//!   rate limiter
//! - Reply providers (offline echo, OpenAI-compatible streaming)
//! - A terminal UI over the chat client

pub mod chat;
pub mod config;
pub mod llm;
pub mod ratelimit;
pub mod transport;
pub mod tui;

pub use config::Config;
