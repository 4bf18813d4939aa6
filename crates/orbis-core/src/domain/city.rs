//! City entities.

use super::StateSummary;
use serde::{Deserialize, Serialize};

/// A city record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct City {
    pub id: i32,
    pub name: String,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    #[serde(rename = "stateId")]
    pub state_id: i32,
}

/// A city as returned by city listings, with its state and country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityWithState {
    #[serde(flatten)]
    pub city: City,
    pub state: StateSummary,
}
