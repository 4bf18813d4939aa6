//! Repository trait definitions.

use async_trait::async_trait;
use orbis_core::{
    CityFilter, CityWithState, Country, CountryDetails, CountryFilter, OrbisResult, Page,
    StateFilter, StateWithCountry,
};

/// Read access to the geographic reference data.
#[async_trait]
pub trait GeoRepository: Send + Sync {
    /// Lists countries matching `filter`, ordered by name.
    async fn find_countries(&self, filter: &CountryFilter) -> OrbisResult<Page<Country>>;

    /// Lists states with their country, ordered by name.
    async fn find_states(&self, filter: &StateFilter) -> OrbisResult<Page<StateWithCountry>>;

    /// Lists cities with their state and country, ordered by name.
    async fn find_cities(&self, filter: &CityFilter) -> OrbisResult<Page<CityWithState>>;

    /// Loads a country with its states, cities, timezones and translations.
    ///
    /// Returns `None` when no country has that id.
    async fn find_country_details(&self, id: i32) -> OrbisResult<Option<CountryDetails>>;
}
