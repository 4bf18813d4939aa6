//! Redis-backed cache store.
//!
//! Holds a single multiplexed [`ConnectionManager`] shared by every request.
//! Each round-trip is bounded by the configured operation timeout.

use super::{CacheError, CacheResult, CacheStore, ScanPage};
use async_trait::async_trait;
use orbis_config::RedisConfig;
use orbis_resilience::{with_timeout_or, RetryPolicy};
use redis::aio::ConnectionManager;
use redis::{Client, RedisError};
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Redis implementation of [`CacheStore`].
pub struct RedisCacheStore {
    client: Client,
    connection: RwLock<Option<ConnectionManager>>,
    operation_timeout: Duration,
    scan_batch_size: usize,
    connect_policy: RetryPolicy,
}

impl RedisCacheStore {
    /// Creates a disconnected store for the configured URL.
    ///
    /// Only the URL is validated here; nothing touches the network until
    /// [`connect`](CacheStore::connect).
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| CacheError::StoreUnavailable(format!("Invalid Redis URL: {}", e)))?;

        Ok(Self {
            client,
            connection: RwLock::new(None),
            operation_timeout: config.operation_timeout(),
            scan_batch_size: config.scan_batch_size.max(1),
            connect_policy: RetryPolicy::with_max_attempts(config.connect_attempts)
                .with_initial_delay(config.connect_backoff()),
        })
    }

    async fn conn(&self) -> CacheResult<ConnectionManager> {
        self.connection
            .read()
            .await
            .clone()
            .ok_or_else(|| CacheError::StoreUnavailable("Redis is not connected".to_string()))
    }

    /// Runs one store round-trip under the operation timeout.
    async fn bounded<T, Fut>(&self, operation: &'static str, fut: Fut) -> CacheResult<T>
    where
        Fut: Future<Output = Result<T, RedisError>>,
    {
        let timeout_ms = u64::try_from(self.operation_timeout.as_millis()).unwrap_or(u64::MAX);
        with_timeout_or(
            self.operation_timeout,
            async { fut.await.map_err(|e| map_redis_error(operation, &e)) },
            |_| CacheError::Timeout {
                operation,
                timeout_ms,
            },
        )
        .await
    }

    async fn open_connection(&self) -> CacheResult<ConnectionManager> {
        self.bounded("CONNECT", async {
            let mut manager = self.client.get_connection_manager().await?;
            redis::cmd("PING").query_async::<String>(&mut manager).await?;
            Ok(manager)
        })
        .await
    }
}

impl std::fmt::Debug for RedisCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheStore")
            .field("operation_timeout", &self.operation_timeout)
            .field("scan_batch_size", &self.scan_batch_size)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn connect(&self) -> CacheResult<()> {
        if self.connection.read().await.is_some() {
            return Ok(());
        }

        info!("Connecting to Redis...");
        let manager = self
            .connect_policy
            .execute(|| self.open_connection())
            .await
            .map_err(|e| match e {
                CacheError::StoreUnavailable(_) => e,
                other => CacheError::StoreUnavailable(other.to_string()),
            })?;

        *self.connection.write().await = Some(manager);
        info!("Redis cache store connected");
        Ok(())
    }

    async fn disconnect(&self) {
        let Some(mut conn) = self.connection.write().await.take() else {
            return;
        };

        if let Err(e) = self
            .bounded("QUIT", redis::cmd("QUIT").query_async::<()>(&mut conn))
            .await
        {
            debug!("Redis QUIT failed, dropping connection anyway: {}", e);
        }
        info!("Redis cache store disconnected");
    }

    async fn is_connected(&self) -> bool {
        let Ok(mut conn) = self.conn().await else {
            return false;
        };
        self.bounded("PING", redis::cmd("PING").query_async::<String>(&mut conn))
            .await
            .is_ok()
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        let mut conn = self.conn().await?;
        self.bounded(
            "SET",
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl_secs)
                .query_async::<()>(&mut conn),
        )
        .await?;

        debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn().await?;
        self.bounded(
            "GET",
            redis::cmd("GET").arg(key).query_async::<Option<String>>(&mut conn),
        )
        .await
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.conn().await?;
        self.bounded("DEL", redis::cmd("DEL").arg(key).query_async::<u64>(&mut conn))
            .await
    }

    async fn scan_page(&self, pattern: &str, cursor: u64) -> CacheResult<ScanPage> {
        let mut conn = self.conn().await?;
        let (cursor, keys) = self
            .bounded(
                "SCAN",
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(pattern)
                    .arg("COUNT")
                    .arg(self.scan_batch_size)
                    .query_async::<(u64, Vec<String>)>(&mut conn),
            )
            .await?;
        Ok(ScanPage { cursor, keys })
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        self.bounded("DEL", redis::cmd("DEL").arg(keys).query_async::<u64>(&mut conn))
            .await
    }
}

/// Classifies a Redis error: transport problems mean the store is unavailable,
/// anything else is a rejected command.
fn map_redis_error(operation: &str, err: &RedisError) -> CacheError {
    if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
        warn!("Redis {} failed, store unreachable: {}", operation, err);
        CacheError::StoreUnavailable(err.to_string())
    } else {
        CacheError::Command(format!("{} failed: {}", operation, err))
    }
}
