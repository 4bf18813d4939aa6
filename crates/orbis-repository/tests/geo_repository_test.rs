//! Integration tests for PgGeoRepository.
//!
//! These tests run against a real PostgreSQL database using testcontainers.
//! Requires Docker to be available on the system.

mod common;

use common::TestDatabase;
use orbis_core::{CityFilter, CountryFilter, StateFilter};
use orbis_repository::{GeoRepository, PgGeoRepository};

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_find_countries_ordered_by_name() {
    let db = TestDatabase::new().await;
    let repo = PgGeoRepository::new(db.pool());

    let page = repo
        .find_countries(&CountryFilter::default())
        .await
        .expect("Query failed");

    assert_eq!(page.meta.total, 2);
    let names: Vec<_> = page.data.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["France", "Japan"]);
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_find_countries_by_iso2_is_case_insensitive_input() {
    let db = TestDatabase::new().await;
    let repo = PgGeoRepository::new(db.pool());

    let filter = CountryFilter {
        iso2: Some("jp".to_string()),
        ..Default::default()
    };
    let page = repo.find_countries(&filter).await.expect("Query failed");

    assert_eq!(page.meta.total, 1);
    assert_eq!(page.data[0].capital.as_deref(), Some("Tokyo"));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_find_countries_free_text_search() {
    let db = TestDatabase::new().await;
    let repo = PgGeoRepository::new(db.pool());

    let filter = CountryFilter {
        q: Some("YEN".to_string()),
        ..Default::default()
    };
    let page = repo.find_countries(&filter).await.expect("Query failed");

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].name, "Japan");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_find_states_by_country_with_paging() {
    let db = TestDatabase::new().await;
    let repo = PgGeoRepository::new(db.pool());

    let filter = StateFilter {
        country_id: Some(1),
        limit: Some(1),
        page: Some(1),
        ..Default::default()
    };
    let page = repo.find_states(&filter).await.expect("Query failed");

    assert_eq!(page.meta.total, 2);
    assert_eq!(page.meta.pages, 2);
    assert_eq!(page.data.len(), 1);
    assert_eq!(page.data[0].state.name, "Normandy");
    assert_eq!(page.data[0].country.iso3.as_deref(), Some("FRA"));
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_find_cities_embeds_state_and_country() {
    let db = TestDatabase::new().await;
    let repo = PgGeoRepository::new(db.pool());

    let filter = CityFilter {
        state_id: Some(10),
        ..Default::default()
    };
    let page = repo.find_cities(&filter).await.expect("Query failed");

    let names: Vec<_> = page.data.iter().map(|c| c.city.name.as_str()).collect();
    assert_eq!(names, vec!["Caen", "Rouen"]);
    assert_eq!(page.data[0].state.name, "Normandy");
    assert_eq!(page.data[0].state.country.name, "France");
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_find_country_details() {
    let db = TestDatabase::new().await;
    let repo = PgGeoRepository::new(db.pool());

    let details = repo
        .find_country_details(1)
        .await
        .expect("Query failed")
        .expect("Country not found");

    assert_eq!(details.country.name, "France");
    assert_eq!(details.states.len(), 2);
    assert_eq!(details.states[0].state.name, "Brittany");
    assert_eq!(details.states[0].cities.len(), 1);
    assert_eq!(details.states[1].cities.len(), 2);
    assert_eq!(details.timezones[0].zone_name.as_deref(), Some("Europe/Paris"));
    assert_eq!(
        details.translations.and_then(|t| t.ja).as_deref(),
        Some("フランス")
    );
}

#[tokio::test]
#[ignore = "requires a Docker daemon"]
async fn test_find_country_details_unknown_id() {
    let db = TestDatabase::new().await;
    let repo = PgGeoRepository::new(db.pool());

    let details = repo.find_country_details(999).await.expect("Query failed");
    assert!(details.is_none());
}
