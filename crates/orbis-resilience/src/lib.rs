//! # Orbis Resilience
//!
//! Retry with backoff and timeouts for calls to backing services
//! (Postgres at startup, Redis on every cache round-trip).

pub mod retry;
pub mod timeout;

pub use retry::*;
pub use timeout::*;
