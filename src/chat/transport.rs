//! Seam between the controller and the network
//!
//! The controller only needs "send these messages, give me the body as a
//! byte stream". [`crate::transport::client::HttpTransport`] is the real
//! implementation; tests script their own.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use thiserror::Error;

use super::message::MessageRequest;

/// Response body as an ordered stream of byte chunks
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, timeout and the like
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// Reading the body failed part way through
    #[error("Stream error: {0}")]
    Stream(String),
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Submit messages.
    ///
    /// `Ok(None)` means the request was accepted but carried no body.
    async fn send(&self, request: &MessageRequest) -> Result<Option<ByteStream>, TransportError>;
}
