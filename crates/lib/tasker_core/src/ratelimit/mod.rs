//! Fixed-window rate limiting keyed by client IP.
//!
//! A [`RateLimiter`] asks a [`CounterStore`] to count one hit against
//! `rate:<client>`. The store performs read, compare, increment and expire
//! as one atomic step, so concurrent requests cannot both slip past the
//! threshold. The window starts with the hit that creates the counter and is
//! not extended by later hits.
//!
//! Any store failure admits the request (fail-open).

pub mod memory;
pub mod redis;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

pub use memory::MemoryCounterStore;
pub use self::redis::RedisCounterStore;

/// Default number of requests admitted per window.
pub const DEFAULT_LIMIT: u64 = 5;

/// Default window length.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Prefix for counter keys.
const KEY_PREFIX: &str = "rate:";

/// Counter store errors.
#[derive(Debug, Error)]
pub enum CounterError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("Counter store timed out after {0:?}")]
    Timeout(Duration),

    #[error("Counter store unavailable: {0}")]
    Unavailable(String),
}

/// Result of counting one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Whether the hit was counted (the counter was below the limit).
    pub admitted: bool,
    /// Counter value after this hit.
    pub count: u64,
    /// Time left in the current window.
    pub ttl: Duration,
}

/// Atomic increment-and-expire counter store.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Atomically read the counter at `key`. When it is below `limit`,
    /// increment it and, if the key has no expiry yet, expire it after
    /// `window`.
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> Result<Hit, CounterError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), CounterError>;

    /// Store identifier for logging.
    fn name(&self) -> &str;
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Counted and under the limit.
    Admit { limit: u64, remaining: u64 },
    /// Over the limit for the current window.
    Reject { limit: u64, retry_after: Duration },
    /// Not evaluated because the store failed.
    Bypass,
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        !matches!(self, Decision::Reject { .. })
    }
}

/// Per-client fixed-window limiter over a shared counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    limit: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, limit: u64, window: Duration) -> Self {
        Self {
            store,
            limit,
            window,
        }
    }

    /// Count one request from `client` and decide whether to admit it.
    pub async fn check(&self, client: &str) -> Decision {
        let key = format!("{KEY_PREFIX}{client}");
        match self.store.hit(&key, self.limit, self.window).await {
            Ok(hit) if hit.admitted => Decision::Admit {
                limit: self.limit,
                remaining: self.limit.saturating_sub(hit.count),
            },
            Ok(hit) => {
                let retry_after = hit.ttl.max(Duration::from_secs(1));
                debug!(client, count = hit.count, ?retry_after, "rate limit exceeded");
                Decision::Reject {
                    limit: self.limit,
                    retry_after,
                }
            }
            Err(e) => {
                warn!(client, store = self.store.name(), error = %e, "rate limiter skipped");
                Decision::Bypass
            }
        }
    }

    /// Probe the backing counter store.
    pub async fn store_health(&self) -> Result<(), CounterError> {
        self.store.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store that is always down.
    struct UnreachableStore;

    #[async_trait]
    impl CounterStore for UnreachableStore {
        async fn hit(&self, _key: &str, _limit: u64, _window: Duration) -> Result<Hit, CounterError> {
            Err(CounterError::Unavailable("connection refused".into()))
        }

        async fn ping(&self) -> Result<(), CounterError> {
            Err(CounterError::Unavailable("connection refused".into()))
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    #[tokio::test]
    async fn admits_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()), 5, DEFAULT_WINDOW);
        for expected_remaining in (0..5).rev() {
            assert_eq!(
                limiter.check("10.0.0.1").await,
                Decision::Admit {
                    limit: 5,
                    remaining: expected_remaining
                }
            );
        }
        match limiter.check("10.0.0.1").await {
            Decision::Reject { limit, retry_after } => {
                assert_eq!(limit, 5);
                assert!(retry_after >= Duration::from_secs(1));
                assert!(retry_after <= DEFAULT_WINDOW);
            }
            other => panic!("expected reject, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()), 1, DEFAULT_WINDOW);
        assert!(limiter.check("10.0.0.1").await.is_admitted());
        assert!(!limiter.check("10.0.0.1").await.is_admitted());
        assert!(limiter.check("10.0.0.2").await.is_admitted());
    }

    #[tokio::test]
    async fn window_expiry_readmits() {
        let window = Duration::from_millis(200);
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()), 2, window);
        assert!(limiter.check("10.0.0.1").await.is_admitted());
        assert!(limiter.check("10.0.0.1").await.is_admitted());
        assert!(!limiter.check("10.0.0.1").await.is_admitted());

        tokio::time::sleep(window + Duration::from_millis(50)).await;
        assert!(limiter.check("10.0.0.1").await.is_admitted());
    }

    #[tokio::test]
    async fn unreachable_store_fails_open() {
        let limiter = RateLimiter::new(Arc::new(UnreachableStore), 1, DEFAULT_WINDOW);
        for _ in 0..10 {
            assert_eq!(limiter.check("10.0.0.1").await, Decision::Bypass);
        }
        assert!(limiter.store_health().await.is_err());
    }

    #[tokio::test]
    async fn concurrent_hits_never_exceed_limit() {
        let limiter = RateLimiter::new(Arc::new(MemoryCounterStore::new()), 5, DEFAULT_WINDOW);
        let mut handles = Vec::new();
        for _ in 0..50 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move { limiter.check("10.0.0.9").await }));
        }
        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_admitted() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 5);
    }
}
