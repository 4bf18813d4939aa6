//! # Orbis Service
//!
//! Query service for the geographic reference data and the cache-aside
//! subsystem it reads through.

pub mod cache;
pub mod geo_service;

pub use cache::*;
pub use geo_service::*;
