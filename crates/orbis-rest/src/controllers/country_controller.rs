//! Country, state and city read endpoints.

use crate::{
    responses::{at_path, messages, ApiResponse, ApiResult},
    state::AppState,
};
use axum::{
    extract::{OriginalUri, Path, Query, State},
    routing::get,
    Json, Router,
};
use orbis_core::{
    CityFilter, CityWithState, Country, CountryDetails, CountryFilter, OrbisError, StateFilter,
    StateWithCountry,
};
use tracing::debug;

/// Creates the country router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_countries))
        .route("/states", get(list_states))
        .route("/cities", get(list_cities))
        .route("/:id", get(get_country))
}

/// List countries with filtering options.
async fn list_countries(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(filter): Query<CountryFilter>,
) -> ApiResult<Vec<Country>> {
    debug!(?filter, "List countries request");

    let page = state
        .geo_service
        .list_countries(filter)
        .await
        .map_err(at_path(uri.path()))?;
    Ok(Json(ApiResponse::page(page, messages::GET_DATA_COUNTRIES)))
}

/// List states with filtering options.
async fn list_states(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(filter): Query<StateFilter>,
) -> ApiResult<Vec<StateWithCountry>> {
    debug!(?filter, "List states request");

    let page = state
        .geo_service
        .list_states(filter)
        .await
        .map_err(at_path(uri.path()))?;
    Ok(Json(ApiResponse::page(page, messages::GET_DATA_STATES)))
}

/// List cities with filtering options.
async fn list_cities(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(filter): Query<CityFilter>,
) -> ApiResult<Vec<CityWithState>> {
    debug!(?filter, "List cities request");

    let page = state
        .geo_service
        .list_cities(filter)
        .await
        .map_err(at_path(uri.path()))?;
    Ok(Json(ApiResponse::page(page, messages::GET_DATA_CITIES)))
}

/// Get one country with its states, cities, timezones and translations.
async fn get_country(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Path(id): Path<String>,
) -> ApiResult<CountryDetails> {
    debug!("Get country request: {}", id);

    let id = parse_country_id(&id).map_err(at_path(uri.path()))?;
    let details = state
        .geo_service
        .country_details(id)
        .await
        .map_err(at_path(uri.path()))?;
    Ok(Json(ApiResponse::ok(details, messages::GET_DATA_COUNTRY)))
}

fn parse_country_id(raw: &str) -> Result<i32, OrbisError> {
    raw.parse()
        .map_err(|_| OrbisError::validation(format!("Invalid country id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_country_id() {
        assert_eq!(parse_country_id("75").unwrap(), 75);
        assert!(matches!(parse_country_id("fr"), Err(OrbisError::Validation(_))));
        assert!(parse_country_id("").is_err());
    }
}
