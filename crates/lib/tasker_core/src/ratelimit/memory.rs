//! In-process counter store.
//!
//! Each key's window lives in a `DashMap` entry; the entry lock makes the
//! read-compare-increment step atomic per key. Counters are not shared
//! between processes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{CounterError, CounterStore, Hit};

/// Expired windows are swept once every this many hits.
const SWEEP_INTERVAL: u64 = 1024;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u64,
    expires_at: Instant,
}

/// `DashMap`-backed [`CounterStore`].
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    windows: DashMap<String, Window>,
    hits: AtomicU64,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep(&self, now: Instant) {
        self.windows.retain(|_, w| w.expires_at > now);
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> Result<Hit, CounterError> {
        let now = Instant::now();
        if self.hits.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == SWEEP_INTERVAL - 1 {
            self.sweep(now);
        }

        let mut entry = self.windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            expires_at: now + window,
        });
        if entry.expires_at <= now {
            *entry = Window {
                count: 0,
                expires_at: now + window,
            };
        }

        let ttl = entry.expires_at.saturating_duration_since(now);
        if entry.count >= limit {
            return Ok(Hit {
                admitted: false,
                count: entry.count,
                ttl,
            });
        }

        entry.count += 1;
        Ok(Hit {
            admitted: true,
            count: entry.count,
            ttl,
        })
    }

    async fn ping(&self) -> Result<(), CounterError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn counts_until_limit() {
        let store = MemoryCounterStore::new();
        for n in 1..=3 {
            let hit = store.hit("rate:a", 3, WINDOW).await.unwrap();
            assert!(hit.admitted);
            assert_eq!(hit.count, n);
        }
        let hit = store.hit("rate:a", 3, WINDOW).await.unwrap();
        assert!(!hit.admitted);
        assert_eq!(hit.count, 3);
    }

    #[tokio::test]
    async fn window_is_fixed_from_first_hit() {
        let store = MemoryCounterStore::new();
        let first = store.hit("rate:a", 10, WINDOW).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = store.hit("rate:a", 10, WINDOW).await.unwrap();
        assert!(second.ttl < first.ttl);
    }

    #[tokio::test]
    async fn expired_windows_are_swept() {
        let store = MemoryCounterStore::new();
        store
            .hit("rate:a", 1, Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(store.windows.len(), 1);
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.sweep(Instant::now());
        assert!(store.windows.is_empty());
    }
}
