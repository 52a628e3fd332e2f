//! Per-client request rate limiting
//!
//! The HTTP gate only sees [`RateLimiter::limit`], an allow/deny decision
//! keyed by client address. [`SlidingWindowLimiter`] is the in-process
//! implementation: a log of recent request times per key.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::config::RateLimitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests left in the current window after this one
    pub remaining: u32,
}

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("Rate limit key is empty")]
    EmptyKey,

    /// The decision backend could not answer
    #[error("Rate limiter unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn limit(&self, key: &str) -> Result<RateLimitDecision, RateLimitError>;
}

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    max_requests: u32,
    window: Duration,
    hits: DashMap<String, VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: DashMap::new(),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    /// Decide for a request from `key` arriving at `now`
    pub fn check_at(&self, key: &str, now: Instant) -> Result<RateLimitDecision, RateLimitError> {
        if key.is_empty() {
            return Err(RateLimitError::EmptyKey);
        }

        let mut log = self.hits.entry(key.to_string()).or_default();
        while let Some(&oldest) = log.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                log.pop_front();
            } else {
                break;
            }
        }

        let used = log.len() as u32;
        if used >= self.max_requests {
            let empty = log.is_empty();
            drop(log);
            if empty {
                self.hits.remove(key);
            }
            return Ok(RateLimitDecision {
                allowed: false,
                remaining: 0,
            });
        }

        log.push_back(now);
        Ok(RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - used - 1,
        })
    }

    /// Number of keys currently tracked
    pub fn tracked_keys(&self) -> usize {
        self.hits.len()
    }

    /// Drop keys whose whole log has aged out
    pub fn prune(&self, now: Instant) {
        let window = self.window;
        self.hits.retain(|_, log| {
            log.back()
                .is_some_and(|&last| now.saturating_duration_since(last) < window)
        });
    }

    /// Prune once per window for as long as the limiter is alive
    pub fn spawn_pruner(self: &Arc<Self>) -> JoinHandle<()> {
        let weak = Arc::downgrade(self);
        let period = self.window.max(Duration::from_millis(10));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(limiter) = weak.upgrade() else {
                    break;
                };
                let before = limiter.tracked_keys();
                limiter.prune(Instant::now());
                let evicted = before.saturating_sub(limiter.tracked_keys());
                if evicted > 0 {
                    tracing::debug!(evicted, "Pruned idle rate limit keys");
                }
            }
        })
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowLimiter {
    async fn limit(&self, key: &str) -> Result<RateLimitDecision, RateLimitError> {
        self.check_at(key, Instant::now())
    }
}
