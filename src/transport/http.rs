//! HTTP server for the chat API

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use super::middleware::rate_limit_gate;
use crate::chat::MessageRequest;
use crate::config::Config;
use crate::llm::{self, ReplyProvider};
use crate::ratelimit::{RateLimiter, SlidingWindowLimiter};

/// Path of the message submission route
pub const MESSAGE_ROUTE: &str = "/api/message";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    replier: Arc<dyn ReplyProvider>,
}

impl AppState {
    pub fn new(replier: Arc<dyn ReplyProvider>) -> Self {
        Self { replier }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    provider: String,
}

pub fn version() -> String {
    format!(
        "{}{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("STREAMCHAT_VERSION_SUFFIX").unwrap_or("")
    )
}

/// Build the router; the limiter, when given, guards only the message route
pub fn router(state: AppState, limiter: Option<Arc<dyn RateLimiter>>) -> Router {
    let mut message_route = Router::new().route(MESSAGE_ROUTE, post(handle_message));
    if let Some(limiter) = limiter {
        message_route =
            message_route.route_layer(middleware::from_fn_with_state(limiter, rate_limit_gate));
    }

    Router::new()
        .route("/health", get(health_check))
        .merge(message_route)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve `app` on an already bound listener, exposing peer addresses to the
/// rate-limit gate
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("HTTP server failed")
}

pub async fn run_http_server(config: &Config) -> Result<()> {
    let replier = llm::create_provider(&config.llm).context("Failed to create reply provider")?;
    tracing::info!("Reply provider: {}", replier.name());

    let limiter: Option<Arc<dyn RateLimiter>> = if config.rate_limit.enabled {
        tracing::info!(
            "Rate limit: {} requests per {}s per client",
            config.rate_limit.max_requests,
            config.rate_limit.window_secs
        );
        let limiter = Arc::new(SlidingWindowLimiter::from_config(&config.rate_limit));
        limiter.spawn_pruner();
        Some(limiter as Arc<dyn RateLimiter>)
    } else {
        tracing::warn!("Rate limiting disabled");
        None
    };

    let app = router(AppState::new(replier), limiter);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("HTTP server listening on {}", addr);

    serve(listener, app).await
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: version(),
        provider: state.replier.name().to_string(),
    })
}

async fn handle_message(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> Response {
    if request.messages.is_empty() {
        return (StatusCode::BAD_REQUEST, "messages must not be empty").into_response();
    }
    tracing::debug!(count = request.messages.len(), "Message received");

    let reply = match state.replier.stream_reply(&request.messages).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Reply provider failed: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to generate a reply")
                .into_response();
        }
    };

    // A failure after the first byte can only end the body early
    let body = reply.map(|chunk| {
        chunk.map_err(|e| {
            tracing::error!("Reply stream failed: {}", e);
            e
        })
    });

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}
