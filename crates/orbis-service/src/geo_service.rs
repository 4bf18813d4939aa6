//! Geographic query service.
//!
//! Every read goes through [`CacheAside`] with a key derived from the
//! request filter, so repeated queries are served from the cache.

use crate::cache::{cache_keys, CacheAside, Ttl};
use async_trait::async_trait;
use orbis_config::CacheConfig;
use orbis_core::{
    CityFilter, CityWithState, Country, CountryDetails, CountryFilter, OrbisError, OrbisResult,
    Page, StateFilter, StateWithCountry,
};
use orbis_repository::GeoRepository;
use std::sync::Arc;
use tracing::{info, instrument};

/// Geographic query service trait.
#[async_trait]
pub trait GeoService: Send + Sync {
    /// Lists countries matching the filter.
    async fn list_countries(&self, filter: CountryFilter) -> OrbisResult<Page<Country>>;

    /// Lists states matching the filter.
    async fn list_states(&self, filter: StateFilter) -> OrbisResult<Page<StateWithCountry>>;

    /// Lists cities matching the filter.
    async fn list_cities(&self, filter: CityFilter) -> OrbisResult<Page<CityWithState>>;

    /// Gets a country with its states, cities, timezones and translations.
    async fn country_details(&self, id: i32) -> OrbisResult<CountryDetails>;

    /// Drops every cached listing and details entry. Returns the number removed.
    async fn invalidate_listings(&self) -> OrbisResult<u64>;

    /// Drops cached entries matching a glob pattern.
    async fn invalidate_pattern(&self, pattern: &str) -> OrbisResult<u64>;
}

/// [`GeoService`] backed by a repository and the cache-aside orchestrator.
pub struct GeoServiceImpl<R: GeoRepository> {
    repository: Arc<R>,
    cache: CacheAside,
    listing_ttl: Ttl,
    details_ttl: Ttl,
}

impl<R: GeoRepository> GeoServiceImpl<R> {
    /// Creates a new service.
    ///
    /// TTL expressions are resolved on every call; an invalid one fails
    /// each request with a validation error.
    pub fn new(repository: Arc<R>, cache: CacheAside, config: &CacheConfig) -> Self {
        Self {
            repository,
            cache,
            listing_ttl: Ttl::from(config.listing_ttl.as_str()),
            details_ttl: Ttl::from(config.details_ttl.as_str()),
        }
    }
}

#[async_trait]
impl<R: GeoRepository + 'static> GeoService for GeoServiceImpl<R> {
    #[instrument(skip(self))]
    async fn list_countries(&self, filter: CountryFilter) -> OrbisResult<Page<Country>> {
        let key = cache_keys::listing_key(&filter);
        self.cache
            .cached(&key, &self.listing_ttl, || self.repository.find_countries(&filter))
            .await
    }

    #[instrument(skip(self))]
    async fn list_states(&self, filter: StateFilter) -> OrbisResult<Page<StateWithCountry>> {
        let key = cache_keys::listing_key(&filter);
        self.cache
            .cached(&key, &self.listing_ttl, || self.repository.find_states(&filter))
            .await
    }

    #[instrument(skip(self))]
    async fn list_cities(&self, filter: CityFilter) -> OrbisResult<Page<CityWithState>> {
        let key = cache_keys::listing_key(&filter);
        self.cache
            .cached(&key, &self.listing_ttl, || self.repository.find_cities(&filter))
            .await
    }

    #[instrument(skip(self))]
    async fn country_details(&self, id: i32) -> OrbisResult<CountryDetails> {
        let key = cache_keys::country_details(id);
        self.cache
            .cached(&key, &self.details_ttl, || self.repository.find_country_details(id))
            .await?
            .ok_or_else(|| OrbisError::NotFound {
                resource_type: "Country",
                id: id.to_string(),
            })
    }

    async fn invalidate_listings(&self) -> OrbisResult<u64> {
        let mut deleted = 0;
        for pattern in cache_keys::geo_patterns() {
            deleted += self.cache.invalidate_by_pattern(&pattern).await?;
        }
        info!(deleted, "Invalidated geographic cache entries");
        Ok(deleted)
    }

    async fn invalidate_pattern(&self, pattern: &str) -> OrbisResult<u64> {
        let deleted = self.cache.invalidate_by_pattern(pattern).await?;
        info!(pattern, deleted, "Invalidated cache entries by pattern");
        Ok(deleted)
    }
}
