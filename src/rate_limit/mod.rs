//! Fixed-window request counting.
//!
//! Each subject (user id or client address) gets one counter per sanitized
//! path and window. The window starts at `now - now % period`, so every
//! counter expires on its own once the period has elapsed.

mod counter;

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use thiserror::Error;

pub use counter::{MemoryRateLimitCounter, RateLimitCounter, RedisRateLimitCounter};

#[derive(Debug, Error)]
pub enum RateLimitError {
    #[error("rate limit backend error: {0}")]
    Backend(String),
}

impl RateLimitError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<redis::RedisError> for RateLimitError {
    fn from(err: redis::RedisError) -> Self {
        Self::backend(err)
    }
}

/// Normalise a request path into the form stored on rate limit rules.
pub fn sanitize_path(path: &str) -> String {
    path.trim_matches('/').replace('/', "_")
}

/// Limit and period applied to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    pub limit: u32,
    pub period: Duration,
}

impl Quota {
    pub fn new(limit: u32, period: Duration) -> Self {
        Self {
            limit,
            period: period.max(Duration::from_secs(1)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub limited: bool,
    pub count: u64,
    /// Seconds until the current window closes.
    pub retry_after: u64,
}

#[derive(Clone)]
pub struct RateLimiter {
    counter: Arc<dyn RateLimitCounter>,
}

impl RateLimiter {
    pub fn new(counter: Arc<dyn RateLimitCounter>) -> Self {
        Self { counter }
    }

    pub async fn is_rate_limited(
        &self,
        subject: &str,
        path: &str,
        quota: Quota,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        self.is_rate_limited_at(subject, path, quota, now).await
    }

    /// Count one request at `now` (unix seconds).
    pub async fn is_rate_limited_at(
        &self,
        subject: &str,
        path: &str,
        quota: Quota,
        now: u64,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let period = quota.period.as_secs().max(1);
        let window_start = now - now % period;
        let key = window_key(subject, path, window_start);

        let count = self.counter.incr(&key, Duration::from_secs(period)).await?;
        Ok(RateLimitDecision {
            limited: count > u64::from(quota.limit),
            count,
            retry_after: (window_start + period).saturating_sub(now).max(1),
        })
    }
}

fn window_key(subject: &str, path: &str, window_start: u64) -> String {
    format!("ratelimit:{subject}:{}:{window_start}", sanitize_path(path))
}
