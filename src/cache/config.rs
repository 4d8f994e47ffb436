//! Cache configuration.

use std::time::Duration;

use serde::Deserialize;

const DEFAULT_CLIENT_MAX_AGE_SECS: u64 = 60;
const DEFAULT_EXPIRATION_SECS: u64 = 3600;

/// Cache tuning from the `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Serve and store cached responses. Invalidation still runs when disabled.
    pub enabled: bool,
    /// `max-age` advertised to clients via `Cache-Control`.
    pub client_max_age_seconds: u64,
    /// TTL for policies that do not set their own expiration.
    pub default_expiration_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            client_max_age_seconds: DEFAULT_CLIENT_MAX_AGE_SECS,
            default_expiration_seconds: DEFAULT_EXPIRATION_SECS,
        }
    }
}

impl CacheConfig {
    pub fn default_expiration(&self) -> Duration {
        Duration::from_secs(self.default_expiration_seconds)
    }
}
