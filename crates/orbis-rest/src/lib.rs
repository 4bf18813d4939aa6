//! # Orbis REST
//!
//! REST API layer using Axum for the Orbis geographic reference data.
//! Provides the country, state and city read endpoints, cache invalidation
//! and health checks.

pub mod controllers;
pub mod middleware;
pub mod responses;
pub mod router;
pub mod state;

pub use router::*;
pub use state::*;
