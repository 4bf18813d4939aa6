//! Cache store abstraction.

use super::{CacheError, CacheResult};
use async_trait::async_trait;
use futures::Stream;
use std::collections::HashSet;
use tracing::debug;

/// One page of a cursor-based key scan.
///
/// A `cursor` of 0 means the scan has completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub cursor: u64,
    pub keys: Vec<String>,
}

/// Key/value store with per-entry TTL, as used by the cache-aside layer.
///
/// Implementations own their connection lifecycle: nothing works before
/// [`connect`](Self::connect) succeeds, and every operation on a disconnected
/// store fails with [`CacheError::StoreUnavailable`].
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;

    /// Establishes the connection.
    async fn connect(&self) -> CacheResult<()>;

    /// Releases the connection. Best-effort and bounded in time.
    async fn disconnect(&self);

    /// Returns true while the store is usable.
    async fn is_connected(&self) -> bool;

    /// Stores `value` under `key`, replacing any entry and resetting its TTL.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()>;

    /// Returns the value under `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Removes `key`, returning the number of entries removed (0 or 1).
    async fn delete(&self, key: &str) -> CacheResult<u64>;

    /// Returns the next page of keys matching the glob `pattern`.
    ///
    /// Start with cursor 0 and feed back the returned cursor until it is 0
    /// again. Keys may repeat across pages.
    async fn scan_page(&self, pattern: &str, cursor: u64) -> CacheResult<ScanPage>;

    /// Removes every key in `keys`, returning how many actually existed.
    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64>;
}

/// Key enumeration and bulk deletion built on the primitive store operations.
#[async_trait]
pub trait CacheStoreExt: CacheStore {
    /// Starts a lazy scan over keys matching `pattern`.
    fn scan_keys(&self, pattern: &str) -> KeyScan<'_, Self> {
        KeyScan::new(self, pattern)
    }

    /// Deletes every key matching `pattern`, batch by batch.
    ///
    /// The total is the sum of what the store reports as removed, so keys
    /// returned twice by the scan are only counted once. A failure before
    /// anything was removed is returned unchanged, whether it came from the
    /// scan or the delete; a failure after that is reported as
    /// [`CacheError::PatternScan`] with the count removed so far.
    async fn delete_by_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let mut scan = self.scan_keys(pattern);
        let mut deleted = 0u64;
        let mut pages = 0u32;

        loop {
            let batch = scan
                .next_batch()
                .await
                .map_err(|e| partial_failure(pattern, deleted, e))?;
            let Some(batch) = batch else { break };
            pages += 1;

            if batch.is_empty() {
                continue;
            }

            deleted += self
                .delete_many(&batch)
                .await
                .map_err(|e| partial_failure(pattern, deleted, e))?;
        }

        debug!(pattern, deleted, pages, "Deleted keys by pattern");
        Ok(deleted)
    }

    /// Deletes every key in the store. Administrative use only.
    async fn delete_all(&self) -> CacheResult<u64> {
        self.delete_by_pattern("*").await
    }
}

impl<T: CacheStore + ?Sized> CacheStoreExt for T {}

fn partial_failure(pattern: &str, deleted: u64, cause: CacheError) -> CacheError {
    if deleted == 0 {
        return cause;
    }
    CacheError::PatternScan {
        pattern: pattern.to_string(),
        deleted,
        message: cause.to_string(),
    }
}

/// A lazy, restartable cursor over keys matching a pattern.
///
/// Tolerates concurrent writes: keys added or removed during the scan may
/// or may not be reported, but the scan always completes once the store
/// hands back cursor 0.
pub struct KeyScan<'a, S: CacheStore + ?Sized> {
    store: &'a S,
    pattern: String,
    cursor: u64,
    finished: bool,
}

impl<'a, S: CacheStore + ?Sized> KeyScan<'a, S> {
    /// Creates a scan positioned at the start.
    pub fn new(store: &'a S, pattern: impl Into<String>) -> Self {
        Self {
            store,
            pattern: pattern.into(),
            cursor: 0,
            finished: false,
        }
    }

    /// The pattern being scanned.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True once the store has returned cursor 0.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetches the next batch, or `None` when the scan is complete.
    ///
    /// Batches may be empty while the scan is still in progress.
    pub async fn next_batch(&mut self) -> CacheResult<Option<Vec<String>>> {
        if self.finished {
            return Ok(None);
        }

        let page = self.store.scan_page(&self.pattern, self.cursor).await?;
        self.cursor = page.cursor;
        self.finished = page.cursor == 0;
        Ok(Some(page.keys))
    }

    /// Rewinds the scan to the beginning.
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.finished = false;
    }

    /// Drains the scan, returning each key once in first-seen order.
    pub async fn collect(mut self) -> CacheResult<Vec<String>> {
        let mut seen = HashSet::new();
        let mut keys = Vec::new();
        while let Some(batch) = self.next_batch().await? {
            for key in batch {
                if seen.insert(key.clone()) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    /// Exposes the remaining batches as a stream.
    pub fn into_stream(self) -> impl Stream<Item = CacheResult<Vec<String>>> + 'a
    where
        S: 'a,
    {
        futures::stream::try_unfold(self, |mut scan| async move {
            Ok(scan.next_batch().await?.map(|batch| (batch, scan)))
        })
    }
}
