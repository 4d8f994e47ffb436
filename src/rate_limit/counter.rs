use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use redis::aio::ConnectionManager;

use super::RateLimitError;

#[async_trait]
pub trait RateLimitCounter: Send + Sync {
    /// Increment `key` and return the new count. A fresh counter expires after `ttl`.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, RateLimitError>;
}

#[derive(Clone)]
pub struct RedisRateLimitCounter {
    connection: ConnectionManager,
}

impl RedisRateLimitCounter {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl RateLimitCounter for RedisRateLimitCounter {
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, RateLimitError> {
        let mut conn = self.connection.clone();
        let count: u64 = redis::cmd("INCR").arg(key).query_async(&mut conn).await?;
        if count == 1 {
            let _: () = redis::cmd("EXPIRE")
                .arg(key)
                .arg(ttl.as_secs().max(1))
                .query_async(&mut conn)
                .await?;
        }
        Ok(count)
    }
}

const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Process-local counters. Expired windows are dropped by a sweep that runs
/// at most once per sweep interval, piggybacked on `incr`.
pub struct MemoryRateLimitCounter {
    counters: DashMap<String, (u64, Instant)>,
    started: Instant,
    sweep_interval: Duration,
    last_sweep_ms: AtomicU64,
}

impl Default for MemoryRateLimitCounter {
    fn default() -> Self {
        Self {
            counters: DashMap::new(),
            started: Instant::now(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            last_sweep_ms: AtomicU64::new(0),
        }
    }
}

impl MemoryRateLimitCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Number of live counters.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.counters.iter().filter(|entry| entry.value().1 > now).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counters held in memory, expired ones included until the next sweep.
    pub fn stored_len(&self) -> usize {
        self.counters.len()
    }

    fn sweep_expired(&self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.started).as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if elapsed.saturating_sub(last) < self.sweep_interval.as_millis() as u64 {
            return;
        }
        // One caller per interval does the walk.
        if self
            .last_sweep_ms
            .compare_exchange(last, elapsed, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        let before = self.counters.len();
        self.counters.retain(|_, (_, expires_at)| *expires_at > now);
        tracing::trace!(
            target = "coinpost::rate_limit",
            removed = before.saturating_sub(self.counters.len()),
            "expired counters swept"
        );
    }
}

#[async_trait]
impl RateLimitCounter for MemoryRateLimitCounter {
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, RateLimitError> {
        let now = Instant::now();
        self.sweep_expired(now);
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert((0, now + ttl));
        if entry.1 <= now {
            *entry = (0, now + ttl);
        }
        entry.0 += 1;
        Ok(entry.0)
    }
}
