//! Process-local cache store.
//!
//! Used when Redis is disabled and by tests. Entries expire lazily: an
//! expired entry is dropped the next time it is read, scanned or counted.

use super::glob::glob_match;
use super::{CacheError, CacheResult, CacheStore, ScanPage};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory [`CacheStore`] with per-entry expiry and glob scans.
#[derive(Debug)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    connected: AtomicBool,
    available: AtomicBool,
    scan_batch_size: usize,
}

impl InMemoryCacheStore {
    /// Creates a disconnected store returning up to `scan_batch_size` keys per scan page.
    #[must_use]
    pub fn new(scan_batch_size: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(false),
            available: AtomicBool::new(true),
            scan_batch_size: scan_batch_size.max(1),
        }
    }

    /// Simulates the store going away (`false`) or coming back (`true`).
    ///
    /// While unavailable every operation, including `connect`, fails with
    /// [`CacheError::StoreUnavailable`]. Stored entries are kept.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.is_expired(now));
        entries.len()
    }

    /// True when no live entries remain.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Time left before `key` expires, if it is present.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.expires_at - now)
    }

    fn ensure_usable(&self) -> CacheResult<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CacheError::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        if !self.connected.load(Ordering::SeqCst) {
            return Err(CacheError::StoreUnavailable("store is not connected".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryCacheStore {
    fn default() -> Self {
        Self::new(100)
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn connect(&self) -> CacheResult<()> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(CacheError::StoreUnavailable(
                "in-memory store marked unavailable".to_string(),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        info!("In-memory cache store ready");
        Ok(())
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!("In-memory cache store closed");
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.available.load(Ordering::SeqCst)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> CacheResult<()> {
        self.ensure_usable()?;
        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(ttl_secs))
            .ok_or_else(|| CacheError::Command(format!("TTL of {}s is out of range", ttl_secs)))?;
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        debug!(key, ttl_secs, "Stored cache entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.ensure_usable()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> CacheResult<u64> {
        self.ensure_usable()?;
        let now = Instant::now();
        let removed = self.entries.lock().await.remove(key);
        Ok(u64::from(removed.is_some_and(|entry| !entry.is_expired(now))))
    }

    async fn scan_page(&self, pattern: &str, cursor: u64) -> CacheResult<ScanPage> {
        self.ensure_usable()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.is_expired(now));

        // The cursor is a slot threshold rather than an offset, so deleting
        // already-visited keys between pages cannot make the scan skip others.
        let mut slots: Vec<(u64, &String)> = entries
            .keys()
            .map(|key| (key_slot(key), key))
            .filter(|(slot, _)| *slot >= cursor)
            .collect();
        slots.sort();

        // Never split keys sharing a slot across pages, or the cursor could stall.
        let mut end = self.scan_batch_size.min(slots.len());
        while end > 0 && end < slots.len() && slots[end].0 == slots[end - 1].0 {
            end += 1;
        }

        let keys = slots[..end]
            .iter()
            .filter(|(_, key)| glob_match(pattern, key))
            .map(|(_, key)| (*key).clone())
            .collect();
        let next = slots.get(end).map_or(0, |(slot, _)| *slot);

        Ok(ScanPage { cursor: next, keys })
    }

    async fn delete_many(&self, keys: &[String]) -> CacheResult<u64> {
        self.ensure_usable()?;
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|entry| !entry.is_expired(now))
            .count();
        Ok(removed as u64)
    }
}

/// Stable, non-zero scan slot for a key. Zero is reserved for "scan complete".
fn key_slot(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish().max(1)
}
