//! Transient user-facing notifications

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Local};

/// How long a toast stays visible
pub const DEFAULT_TOAST_TTL_MS: i64 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub level: ToastLevel,
    pub created_at: DateTime<Local>,
}

/// Shared toast queue
#[derive(Debug, Clone)]
pub struct Toaster {
    toasts: Arc<RwLock<Vec<Toast>>>,
    ttl: Duration,
}

impl Default for Toaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Toaster {
    pub fn new() -> Self {
        Self::with_ttl(Duration::milliseconds(DEFAULT_TOAST_TTL_MS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            toasts: Arc::new(RwLock::new(Vec::new())),
            ttl,
        }
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(message.into(), ToastLevel::Error);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(message.into(), ToastLevel::Info);
    }

    fn push(&self, message: String, level: ToastLevel) {
        tracing::debug!(?level, "toast: {}", message);
        let toast = Toast {
            message,
            level,
            created_at: Local::now(),
        };
        self.toasts
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .push(toast);
    }

    /// Toasts that have not expired at `now`, oldest first
    pub fn active_at(&self, now: DateTime<Local>) -> Vec<Toast> {
        let mut toasts = self.toasts.write().unwrap_or_else(|p| p.into_inner());
        toasts.retain(|t| now - t.created_at < self.ttl);
        toasts.clone()
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Local::now())
    }

    /// Every toast ever pushed and not yet pruned, without expiring any
    pub fn all(&self) -> Vec<Toast> {
        self.toasts
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn clear(&self) {
        self.toasts
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .clear();
    }
}
