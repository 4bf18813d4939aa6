//! Country, timezone and translation entities.

use super::StateWithCities;
use serde::{Deserialize, Serialize};

/// A country record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Country {
    pub id: i32,
    pub name: String,
    pub iso3: Option<String>,
    pub iso2: Option<String>,
    pub numeric_code: Option<String>,
    pub phonecode: Option<String>,
    pub capital: Option<String>,
    pub currency: Option<String>,
    pub currency_name: Option<String>,
    pub currency_symbol: Option<String>,
    pub tld: Option<String>,
    pub native: Option<String>,
    pub region: Option<String>,
    pub region_id: Option<i32>,
    pub subregion: Option<String>,
    pub subregion_id: Option<i32>,
    pub nationality: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub emoji: Option<String>,
    #[serde(rename = "emojiU")]
    pub emoji_u: Option<String>,
}

/// The identifying subset of a country embedded in state and city listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountrySummary {
    pub id: i32,
    pub name: String,
    pub iso3: Option<String>,
    pub iso2: Option<String>,
}

impl From<&Country> for CountrySummary {
    fn from(country: &Country) -> Self {
        Self {
            id: country.id,
            name: country.name.clone(),
            iso3: country.iso3.clone(),
            iso2: country.iso2.clone(),
        }
    }
}

/// A timezone observed in a country.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Timezone {
    pub id: i32,
    pub zone_name: Option<String>,
    pub gmt_offset: Option<i32>,
    pub gmt_offset_name: Option<String>,
    pub abbreviation: Option<String>,
    pub tz_name: Option<String>,
    pub country_id: i32,
}

/// Localised names of a country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Translation {
    pub id: i32,
    #[serde(rename = "countryId")]
    pub country_id: i32,
    pub ko: Option<String>,
    #[serde(rename = "ptBR")]
    pub pt_br: Option<String>,
    pub pt: Option<String>,
    pub nl: Option<String>,
    pub hr: Option<String>,
    pub fa: Option<String>,
    pub de: Option<String>,
    pub es: Option<String>,
    pub fr: Option<String>,
    pub ja: Option<String>,
    pub it: Option<String>,
    #[serde(rename = "zhCN")]
    pub zh_cn: Option<String>,
    pub tr: Option<String>,
    pub ru: Option<String>,
    pub uk: Option<String>,
    pub pl: Option<String>,
}

/// A country together with its states (and their cities), timezones and
/// translations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryDetails {
    #[serde(flatten)]
    pub country: Country,
    pub states: Vec<StateWithCities>,
    pub timezones: Vec<Timezone>,
    pub translations: Option<Translation>,
}
