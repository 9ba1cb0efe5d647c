//! Rate limiter for preventing brute force attacks on the auth endpoints

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed within the window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds once the window is exhausted
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window_seconds: 300,        // 5 minutes
            ban_duration_seconds: 3600, // 1 hour
        }
    }
}

impl RateLimiterConfig {
    /// Create a config from environment variables, falling back to defaults
    ///
    /// # Environment Variables
    /// - `AUTH_RATE_LIMIT_MAX_ATTEMPTS`
    /// - `AUTH_RATE_LIMIT_WINDOW_SECONDS`
    /// - `AUTH_RATE_LIMIT_BAN_SECONDS`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let read = |var: &str, fallback: u64| {
            std::env::var(var)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(fallback)
        };

        Self {
            max_attempts: read("AUTH_RATE_LIMIT_MAX_ATTEMPTS", defaults.max_attempts as u64) as u32,
            window_seconds: read("AUTH_RATE_LIMIT_WINDOW_SECONDS", defaults.window_seconds),
            ban_duration_seconds: read("AUTH_RATE_LIMIT_BAN_SECONDS", defaults.ban_duration_seconds),
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    last_attempt: Instant,
    ban_expires: Option<Instant>,
}

/// In-process rate limiter keyed by client identity
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Record an attempt for `key` and report whether it is allowed
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            last_attempt: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.attempts = 0;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.duration_since(entry.last_attempt) >= Duration::from_secs(self.config.window_seconds)
        {
            entry.attempts = 0;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Rate limit exceeded for {}, banned for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        entry.last_attempt = now;

        true
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_max_attempts() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 3,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        });

        for _ in 0..3 {
            assert!(limiter.is_allowed("jdoe").await);
        }
        assert!(!limiter.is_allowed("jdoe").await);
        // Ban persists on subsequent attempts
        assert!(!limiter.is_allowed("jdoe").await);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_attempts: 1,
            window_seconds: 300,
            ban_duration_seconds: 3600,
        });

        assert!(limiter.is_allowed("alice").await);
        assert!(!limiter.is_allowed("alice").await);
        assert!(limiter.is_allowed("bob").await);
    }
}
