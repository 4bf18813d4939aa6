//! Read-through caching for expensive, deterministic computations.

use super::{CacheError, CacheResult, CacheStore, CacheStoreExt, Ttl};
use orbis_core::OrbisResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Capacity of the background error channel. Slow subscribers lag rather
/// than block writers.
const ERROR_CHANNEL_CAPACITY: usize = 64;

/// Cache-aside orchestrator.
///
/// Callers hand over a key, a TTL and a computation; serialization, TTL
/// arithmetic and store failures are handled here. The store is never
/// exposed to callers beyond [`invalidate`](Self::invalidate) and
/// [`invalidate_by_pattern`](Self::invalidate_by_pattern).
#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    errors: broadcast::Sender<CacheError>,
}

impl CacheAside {
    /// Creates an orchestrator over `store`.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        let (errors, _) = broadcast::channel(ERROR_CHANNEL_CAPACITY);
        Self { store, errors }
    }

    /// The underlying store, for lifecycle management at startup and shutdown.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Subscribes to failures of background cache writes.
    ///
    /// Writes never fail the call that triggered them; this is where they
    /// surface instead.
    #[must_use]
    pub fn subscribe_errors(&self) -> broadcast::Receiver<CacheError> {
        self.errors.subscribe()
    }

    /// Returns the cached value for `key`, or computes, stores and returns it.
    ///
    /// - A malformed `ttl` fails before the store or `compute` is touched.
    /// - On a hit `compute` is not invoked.
    /// - If the store is unavailable the result of `compute` is returned
    ///   without write-back. A timed-out or undecodable lookup counts as a miss.
    /// - Results serializing to `null`, `""`, `[]` or `{}` are never stored.
    /// - The write runs on its own task, so it completes even if the caller
    ///   is cancelled; its failure is logged and never returned.
    ///
    /// Errors from `compute` propagate unchanged.
    pub async fn cached<T, F, Fut>(&self, key: &str, ttl: impl Into<Ttl>, compute: F) -> OrbisResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = OrbisResult<T>>,
    {
        let ttl_secs = ttl.into().resolve()?;

        let write_back = match self.store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    debug!(key, "Cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    true
                }
            },
            Ok(None) => {
                debug!(key, "Cache miss");
                true
            }
            Err(CacheError::StoreUnavailable(reason)) => {
                warn!(key, %reason, "Cache store unavailable, serving uncached result");
                false
            }
            Err(e) => {
                warn!(key, error = %e, "Cache lookup failed, treating as miss");
                true
            }
        };

        let value = compute().await?;

        if write_back {
            self.populate(key, &value, ttl_secs).await;
        }
        Ok(value)
    }

    /// Removes one entry. Returns 0 when it did not exist.
    pub async fn invalidate(&self, key: &str) -> CacheResult<u64> {
        let deleted = self.store.delete(key).await?;
        debug!(key, deleted, "Invalidated cache key");
        Ok(deleted)
    }

    /// Removes every entry matching the glob `pattern`.
    pub async fn invalidate_by_pattern(&self, pattern: &str) -> CacheResult<u64> {
        self.store.delete_by_pattern(pattern).await
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let json = match serde_json::to_value(value) {
            Ok(json) if is_empty(&json) => {
                debug!(key, "Not caching empty result");
                return;
            }
            Ok(json) => json.to_string(),
            Err(e) => {
                self.report(key, CacheError::from(e));
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let errors = self.errors.clone();
        let owned_key = key.to_string();
        let write = tokio::spawn(async move {
            match store.set_with_ttl(&owned_key, &json, ttl_secs).await {
                Ok(()) => debug!(key = %owned_key, ttl_secs, "Populated cache entry"),
                Err(e) => {
                    warn!(key = %owned_key, error = %e, "Cache write failed");
                    // No subscribers is fine.
                    let _ = errors.send(e);
                }
            }
        });

        if let Err(e) = write.await {
            self.report(key, CacheError::Command(format!("cache write task failed: {}", e)));
        }
    }

    fn report(&self, key: &str, err: CacheError) {
        warn!(key, error = %err, "Cache write skipped");
        let _ = self.errors.send(err);
    }
}

impl std::fmt::Debug for CacheAside {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAside")
            .field("backend", &self.store.backend())
            .finish_non_exhaustive()
    }
}

/// JSON values that are not worth caching.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{InMemoryCacheStore, ScanPage};
    use async_trait::async_trait;
    use orbis_core::OrbisError;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Country {
        id: i32,
        name: String,
    }

    fn france() -> Country {
        Country {
            id: 75,
            name: "France".to_string(),
        }
    }

    /// In-memory store with injectable failures and delays.
    #[derive(Default)]
    struct ScriptedStore {
        inner: InMemoryCacheStore,
        get_error: Option<CacheError>,
        set_error: Option<CacheError>,
        set_delay: Option<Duration>,
        delete_error: Option<CacheError>,
        /// Fail `scan_page` once this many pages have been served.
        scan_fails_after: Option<u32>,
        scans: AtomicU32,
    }

    impl ScriptedStore {
        async fn connected(self) -> Self {
            self.inner.connect().await.unwrap();
            self
        }
    }

    #[async_trait]
    impl CacheStore for ScriptedStore {
        fn backend(&self) -> &'static str {
            "scripted"
        }

        async fn connect(&self) -> CacheResult<()> {
            self.inner.connect().await
        }

        async fn disconnect(&self) {
            self.inner.disconnect().await;
        }

        async fn is_connected(&self) -> bool {
            self.inner.is_connected().await
        }

        async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
            if let Some(delay) = self.set_delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(err) = &self.set_error {
                return Err(err.clone());
            }
            self.inner.set_with_ttl(key, value, ttl_secs).await
        }

        async fn get(&self, key: &str) -> CacheResult<Option<String>> {
            if let Some(err) = &self.get_error {
                return Err(err.clone());
            }
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> CacheResult<u64> {
            self.inner.delete(key).await
        }

        async fn scan_page(&self, pattern: &str, cursor: u64) -> CacheResult<ScanPage> {
            let served = self.scans.fetch_add(1, Ordering::SeqCst);
            if self.scan_fails_after.is_some_and(|limit| served >= limit) {
                return Err(CacheError::StoreUnavailable("connection reset".to_string()));
            }
            self.inner.scan_page(pattern, cursor).await
        }

        async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
            if let Some(err) = &self.delete_error {
                return Err(err.clone());
            }
            self.inner.delete_many(keys).await
        }
    }

    async fn memory_store() -> Arc<InMemoryCacheStore> {
        let store = Arc::new(InMemoryCacheStore::new(10));
        store.connect().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_miss_computes_once_and_returns_result() {
        let store = memory_store().await;
        let aside = CacheAside::new(store.clone());
        let calls = AtomicU32::new(0);

        let value = aside
            .cached("country:75:details", "1 month", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(france())
            })
            .await
            .unwrap();

        assert_eq!(value, france());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            store.remaining_ttl("country:75:details").await.map(|ttl| ttl.as_secs() > 2_591_000),
            Some(true)
        );
    }

    #[tokio::test]
    async fn test_hit_skips_compute() {
        let store = memory_store().await;
        let aside = CacheAside::new(store);
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value: Country = aside
                .cached("countries:page=0|limit=10", 600u64, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(france())
                })
                .await
                .unwrap();
            assert_eq!(value, france());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stored_value_round_trips() {
        let store = memory_store().await;
        let aside = CacheAside::new(store.clone());

        aside.cached("k", 60u64, || async { Ok(vec![france()]) }).await.unwrap();

        let raw = store.get("k").await.unwrap().unwrap();
        let decoded: Vec<Country> = serde_json::from_str(&raw).unwrap();
        assert_eq!(decoded, vec![france()]);
    }

    #[tokio::test]
    async fn test_bad_ttl_fails_before_compute() {
        let store = memory_store().await;
        let aside = CacheAside::new(store);
        let calls = AtomicU32::new(0);

        let err = aside
            .cached("k", "abc", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OrbisError::Validation(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_results_are_not_stored() {
        let store = memory_store().await;
        let aside = CacheAside::new(store.clone());

        let none: Option<Country> = aside.cached("null", 60u64, || async { Ok(None) }).await.unwrap();
        let empty_list: Vec<Country> = aside.cached("list", 60u64, || async { Ok(vec![]) }).await.unwrap();
        let empty_text: String = aside.cached("text", 60u64, || async { Ok(String::new()) }).await.unwrap();
        let empty_map: std::collections::HashMap<String, i32> =
            aside.cached("map", 60u64, || async { Ok(Default::default()) }).await.unwrap();

        assert!(none.is_none() && empty_list.is_empty() && empty_text.is_empty() && empty_map.is_empty());
        for key in ["null", "list", "text", "map"] {
            assert_eq!(store.get(key).await.unwrap(), None, "{key} should not be cached");
        }
    }

    #[tokio::test]
    async fn test_falsy_scalars_are_still_stored() {
        let store = memory_store().await;
        let aside = CacheAside::new(store.clone());

        aside.cached("zero", 60u64, || async { Ok(0) }).await.unwrap();
        aside.cached("false", 60u64, || async { Ok(false) }).await.unwrap();

        assert_eq!(store.get("zero").await.unwrap().as_deref(), Some("0"));
        assert_eq!(store.get("false").await.unwrap().as_deref(), Some("false"));
    }

    #[tokio::test]
    async fn test_compute_errors_propagate_and_nothing_is_stored() {
        let store = memory_store().await;
        let aside = CacheAside::new(store.clone());

        let err = aside
            .cached("k", 60u64, || async {
                Err::<Country, _>(OrbisError::Database("relation does not exist".to_string()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, OrbisError::Database(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_fail_open_when_store_unavailable() {
        let store = memory_store().await;
        store.set_available(false);
        let aside = CacheAside::new(store.clone());
        let calls = AtomicU32::new(0);

        for _ in 0..2 {
            let value = aside
                .cached("k", 60u64, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(france())
                })
                .await
                .unwrap();
            assert_eq!(value, france());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        store.set_available(true);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_timed_out_lookup_is_a_miss() {
        let store = Arc::new(
            ScriptedStore {
                get_error: Some(CacheError::Timeout {
                    operation: "GET",
                    timeout_ms: 2000,
                }),
                ..Default::default()
            }
            .connected()
            .await,
        );
        let aside = CacheAside::new(store.clone());

        let value = aside.cached("k", 60u64, || async { Ok(france()) }).await.unwrap();

        assert_eq!(value, france());
        assert!(store.inner.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_recomputed_and_overwritten() {
        let store = memory_store().await;
        store.set_with_ttl("k", "{not json", 60).await.unwrap();
        let aside = CacheAside::new(store.clone());

        let value = aside.cached("k", 60u64, || async { Ok(france()) }).await.unwrap();

        assert_eq!(value, france());
        let raw = store.get("k").await.unwrap().unwrap();
        assert_eq!(serde_json::from_str::<Country>(&raw).unwrap(), france());
    }

    #[tokio::test]
    async fn test_write_failure_is_reported_not_returned() {
        let store = Arc::new(
            ScriptedStore {
                set_error: Some(CacheError::Timeout {
                    operation: "SET",
                    timeout_ms: 2000,
                }),
                ..Default::default()
            }
            .connected()
            .await,
        );
        let aside = CacheAside::new(store);
        let mut errors = aside.subscribe_errors();

        let value = aside.cached("k", 60u64, || async { Ok(france()) }).await.unwrap();

        assert_eq!(value, france());
        assert!(matches!(errors.try_recv(), Ok(CacheError::Timeout { operation: "SET", .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_survives_caller_cancellation() {
        let store = Arc::new(
            ScriptedStore {
                set_delay: Some(Duration::from_millis(50)),
                ..Default::default()
            }
            .connected()
            .await,
        );
        let aside = CacheAside::new(store.clone());

        let caller = tokio::spawn({
            let aside = aside.clone();
            async move { aside.cached("k", 60u64, || async { Ok(vec![1, 2, 3]) }).await }
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(store.inner.get("k").await.unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[tokio::test]
    async fn test_invalidate_missing_key_returns_zero() {
        let aside = CacheAside::new(memory_store().await);
        assert_eq!(aside.invalidate("never-set").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let store = memory_store().await;
        let aside = CacheAside::new(store.clone());
        aside.cached("k", 60u64, || async { Ok(1) }).await.unwrap();

        assert_eq!(aside.invalidate("k").await.unwrap(), 1);
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalidate_by_pattern_removes_only_matches() {
        let store = memory_store().await;
        for key in ["countries:a", "countries:b", "states:a"] {
            store.set_with_ttl(key, "1", 60).await.unwrap();
        }
        let aside = CacheAside::new(store.clone());

        assert_eq!(aside.invalidate_by_pattern("countries:*").await.unwrap(), 2);
        assert_eq!(store.get("states:a").await.unwrap().as_deref(), Some("1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidation_surfaces_store_errors() {
        let store = memory_store().await;
        store.set_available(false);
        let aside = CacheAside::new(store);

        assert!(aside.invalidate("k").await.unwrap_err().is_unavailable());
        assert!(aside.invalidate_by_pattern("countries:*").await.unwrap_err().is_unavailable());
    }

    #[tokio::test]
    async fn test_pattern_failure_midway_reports_partial_count() {
        let store = ScriptedStore {
            inner: InMemoryCacheStore::new(2),
            scan_fails_after: Some(1),
            ..Default::default()
        }
        .connected()
        .await;
        for i in 0..6 {
            store.inner.set_with_ttl(&format!("countries:{i}"), "1", 60).await.unwrap();
        }
        let aside = CacheAside::new(Arc::new(store));

        let err = aside.invalidate_by_pattern("countries:*").await.unwrap_err();

        match err {
            CacheError::PatternScan { pattern, deleted, .. } => {
                assert_eq!(pattern, "countries:*");
                assert_eq!(deleted, 2);
            }
            other => panic!("expected PatternScan, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_failure_before_any_removal_is_returned_unchanged() {
        let store = ScriptedStore {
            delete_error: Some(CacheError::StoreUnavailable("connection reset".to_string())),
            ..Default::default()
        }
        .connected()
        .await;
        store.inner.set_with_ttl("countries:a", "1", 60).await.unwrap();
        let aside = CacheAside::new(Arc::new(store));

        let err = aside.invalidate_by_pattern("countries:*").await.unwrap_err();

        assert!(err.is_unavailable(), "got {err:?}");
        assert_eq!(OrbisError::from(err).status_code(), 503);
    }
}
