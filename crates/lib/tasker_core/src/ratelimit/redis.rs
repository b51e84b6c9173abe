//! Redis counter store.
//!
//! The whole check runs as one Lua script so Redis serializes it against
//! every other client. The connection is established lazily and reused
//! through a `ConnectionManager`, which reconnects on its own after Redis
//! comes back.
//!
//! Until the first connection succeeds, only one caller at a time attempts
//! it. Concurrent callers and callers arriving within [`RECONNECT_COOLDOWN`]
//! of a failed attempt get [`CounterError::Unavailable`] immediately.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use ::redis::aio::{ConnectionManager, ConnectionManagerConfig};
use ::redis::{Client, Script};
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::{CounterError, CounterStore, Hit};

/// Upper bound on establishing the first connection.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Per-attempt TCP connect timeout inside the connection manager.
const ATTEMPT_TIMEOUT: Duration = Duration::from_millis(100);

/// Connection attempts the manager retries before giving up.
const CONNECT_RETRIES: usize = 1;

/// Upper bound on a single command round trip.
const COMMAND_TIMEOUT: Duration = Duration::from_millis(250);

/// Wait after a failed connect before trying again.
pub const RECONNECT_COOLDOWN: Duration = Duration::from_secs(2);

/// KEYS[1] = counter key, ARGV[1] = limit, ARGV[2] = window seconds.
/// Returns `{admitted, count, ttl}`.
const HIT_SCRIPT: &str = r#"
local limit = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local current = tonumber(redis.call('GET', KEYS[1]) or '0')
local admitted = 0
if current < limit then
    current = redis.call('INCR', KEYS[1])
    admitted = 1
end
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 and current > 0 then
    redis.call('EXPIRE', KEYS[1], window)
    ttl = window
end
return {admitted, current, ttl}
"#;

/// Redis-backed [`CounterStore`].
pub struct RedisCounterStore {
    client: Client,
    conn: OnceCell<ConnectionManager>,
    script: Script,
    /// Set while one caller is connecting.
    connecting: AtomicBool,
    /// Milliseconds after `epoch` of the last failed connect, plus one.
    /// Zero means no failure recorded.
    failed_at: AtomicU64,
    epoch: Instant,
}

/// Clears the `connecting` flag when the attempt ends or is cancelled.
struct ConnectingGuard<'a>(&'a AtomicBool);

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl RedisCounterStore {
    /// Parse `redis_url`. No connection is made until the first command.
    pub fn open(redis_url: &str) -> Result<Self, CounterError> {
        Ok(Self {
            client: Client::open(redis_url)?,
            conn: OnceCell::new(),
            script: Script::new(HIT_SCRIPT),
            connecting: AtomicBool::new(false),
            failed_at: AtomicU64::new(0),
            epoch: Instant::now(),
        })
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn cooling_down(&self) -> bool {
        match self.failed_at.load(Ordering::Acquire) {
            0 => false,
            marked => {
                self.elapsed_ms().saturating_sub(marked - 1)
                    < RECONNECT_COOLDOWN.as_millis() as u64
            }
        }
    }

    async fn connection(&self) -> Result<ConnectionManager, CounterError> {
        if let Some(conn) = self.conn.get() {
            return Ok(conn.clone());
        }
        if self.cooling_down() {
            return Err(CounterError::Unavailable(
                "waiting to reconnect after a failed attempt".into(),
            ));
        }
        if self.connecting.swap(true, Ordering::AcqRel) {
            return Err(CounterError::Unavailable("connection in progress".into()));
        }
        let _guard = ConnectingGuard(&self.connecting);

        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(CONNECT_RETRIES)
            .set_connection_timeout(ATTEMPT_TIMEOUT);
        let attempt = tokio::time::timeout(
            CONNECT_TIMEOUT,
            self.client.get_connection_manager_with_config(config),
        )
        .await
        .map_err(|_| CounterError::Timeout(CONNECT_TIMEOUT))
        .and_then(|res| res.map_err(CounterError::from));

        match attempt {
            Ok(conn) => {
                info!("connected to redis counter store");
                self.failed_at.store(0, Ordering::Release);
                let _ = self.conn.set(conn.clone());
                Ok(conn)
            }
            Err(e) => {
                warn!(error = %e, cooldown = ?RECONNECT_COOLDOWN, "redis connect failed");
                self.failed_at
                    .store(self.elapsed_ms().saturating_add(1), Ordering::Release);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn hit(&self, key: &str, limit: u64, window: Duration) -> Result<Hit, CounterError> {
        let mut conn = self.connection().await?;
        let window_secs = window.as_secs().max(1);

        let mut invocation = self.script.key(key);
        invocation.arg(limit).arg(window_secs);
        let (admitted, count, ttl): (i64, i64, i64) = tokio::time::timeout(
            COMMAND_TIMEOUT,
            invocation.invoke_async(&mut conn),
        )
        .await
        .map_err(|_| CounterError::Timeout(COMMAND_TIMEOUT))??;

        Ok(Hit {
            admitted: admitted == 1,
            count: count.max(0) as u64,
            ttl: Duration::from_secs(ttl.max(0) as u64),
        })
    }

    async fn ping(&self) -> Result<(), CounterError> {
        let mut conn = self.connection().await?;
        let _: String = tokio::time::timeout(
            COMMAND_TIMEOUT,
            ::redis::cmd("PING").query_async(&mut conn),
        )
        .await
        .map_err(|_| CounterError::Timeout(COMMAND_TIMEOUT))??;
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}
