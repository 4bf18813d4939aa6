//! Caching infrastructure for the service layer.
//!
//! [`CacheStore`] is the adapter over the key/value backend (Redis in
//! production, an in-memory store otherwise); [`CacheAside`] is the
//! orchestrator the query service goes through.

mod cache_aside;
pub mod cache_keys;
mod error;
pub mod glob;
mod memory_store;
mod redis_store;
mod store;
mod ttl;

pub use cache_aside::CacheAside;
pub use error::{CacheError, CacheResult};
pub use memory_store::InMemoryCacheStore;
pub use redis_store::RedisCacheStore;
pub use store::{CacheStore, CacheStoreExt, KeyScan, ScanPage};
pub use ttl::{parse_duration, Ttl, MAX_TTL_SECS};
