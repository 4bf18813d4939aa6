//! Application state for Axum handlers.

use orbis_service::{CacheAside, GeoService};
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub geo_service: Arc<dyn GeoService>,
    pub cache: CacheAside,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(geo_service: Arc<dyn GeoService>, cache: CacheAside) -> Self {
        Self { geo_service, cache }
    }
}
