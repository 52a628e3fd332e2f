//! Transport layer: HTTP server, HTTP client and CLI entry points

pub mod cli;
pub mod client;
pub mod http;
pub mod middleware;

pub use client::HttpTransport;
pub use http::{router, run_http_server, serve, AppState, MESSAGE_ROUTE};
pub use middleware::{RATE_LIMITED_REPLY, RATE_LIMIT_FAILED_REPLY};
