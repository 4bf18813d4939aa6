//! State entities.

use super::{City, CountrySummary};
use serde::{Deserialize, Serialize};

/// A first-level administrative division of a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct State {
    pub id: i32,
    pub name: String,
    pub state_code: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub kind: Option<String>,
    #[serde(rename = "countryId")]
    pub country_id: i32,
}

/// A state as returned by state listings, with its country summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateWithCountry {
    #[serde(flatten)]
    pub state: State,
    pub country: CountrySummary,
}

/// The identifying subset of a state embedded in city listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSummary {
    pub id: i32,
    pub name: String,
    pub state_code: Option<String>,
    pub country: CountrySummary,
}

/// A state with all of its cities, used by country details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateWithCities {
    #[serde(flatten)]
    pub state: State,
    pub cities: Vec<City>,
}
