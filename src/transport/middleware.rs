//! Rate-limit gate for the message route

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::ratelimit::RateLimiter;

/// Reply sent instead of the assistant text when a client is over its limit
pub const RATE_LIMITED_REPLY: &str = "You are writing messages too fast.";

/// Reply sent when the limiter itself fails
pub const RATE_LIMIT_FAILED_REPLY: &str =
    "Sorry, something went wrong processing your message. Please try again later.";

/// Key used when the peer address is unknown
pub const FALLBACK_CLIENT_ADDR: &str = "127.0.0.1";

/// Both replies go out as 200 so the chat client renders them as the
/// assistant's answer.
fn plain_reply(text: &'static str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        text,
    )
        .into_response()
}

pub fn client_addr(req: &Request) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| FALLBACK_CLIENT_ADDR.to_string())
}

pub async fn rate_limit_gate(
    State(limiter): State<Arc<dyn RateLimiter>>,
    req: Request,
    next: Next,
) -> Response {
    let addr = client_addr(&req);

    match limiter.limit(&addr).await {
        Ok(decision) if decision.allowed => {
            tracing::debug!(client = %addr, remaining = decision.remaining, "Request allowed");
            next.run(req).await
        }
        Ok(_) => {
            tracing::warn!(client = %addr, "Rate limit exceeded");
            plain_reply(RATE_LIMITED_REPLY)
        }
        Err(e) => {
            tracing::error!(client = %addr, "Rate limiter failed: {}", e);
            plain_reply(RATE_LIMIT_FAILED_REPLY)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_client_addr_falls_back() {
        let req = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
        assert_eq!(client_addr(&req), "127.0.0.1");
    }

    #[test]
    fn test_client_addr_from_connect_info() {
        let mut req = axum::http::Request::builder().uri("/").body(Body::empty()).unwrap();
        let addr: SocketAddr = "10.1.2.3:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_addr(&req), "10.1.2.3");
    }
}
