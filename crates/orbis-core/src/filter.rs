//! Tagged query filters for the listing endpoints.
//!
//! Each resource has a filter struct with optional membership per field, as
//! it arrives from a query string, and a criterion enum with exactly one
//! variant per supported field. [`Filter::criteria`] normalises the former
//! into the latter in declaration order; both the SQL builder and the cache
//! key derivation consume the criteria, so two filters that yield the same
//! criteria always hit the same rows and the same cache entry.

use crate::PageRequest;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// A single normalised filter criterion.
pub trait Criterion {
    /// Stable field name used in cache keys.
    fn field(&self) -> &'static str;

    /// Normalised value used in cache keys.
    fn value(&self) -> String;
}

/// A resource filter that can be turned into ordered criteria and a page.
pub trait Filter {
    /// The criterion type for this resource.
    type Criterion: Criterion;

    /// Logical resource name used as the cache key prefix.
    const RESOURCE: &'static str;

    /// Returns the present criteria in declaration order.
    fn criteria(&self) -> Vec<Self::Criterion>;

    /// Returns the requested page.
    fn page_request(&self) -> PageRequest;
}

// ============ Countries ============

/// Query filter for country listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub iso3: Option<String>,
    #[serde(default)]
    pub iso2: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    /// Free-text search across the searchable country fields.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<usize>,
}

/// A normalised country filter criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryCriterion {
    Name(String),
    Iso3(String),
    Iso2(String),
    Currency(String),
    Capital(String),
    Region(String),
    Subregion(String),
    Nationality(String),
    Search(String),
}

impl Criterion for CountryCriterion {
    fn field(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Iso3(_) => "iso3",
            Self::Iso2(_) => "iso2",
            Self::Currency(_) => "currency",
            Self::Capital(_) => "capital",
            Self::Region(_) => "region",
            Self::Subregion(_) => "subregion",
            Self::Nationality(_) => "nationality",
            Self::Search(_) => "q",
        }
    }

    fn value(&self) -> String {
        match self {
            Self::Name(v)
            | Self::Iso3(v)
            | Self::Iso2(v)
            | Self::Currency(v)
            | Self::Capital(v)
            | Self::Region(v)
            | Self::Subregion(v)
            | Self::Nationality(v)
            | Self::Search(v) => v.clone(),
        }
    }
}

impl Filter for CountryFilter {
    type Criterion = CountryCriterion;

    const RESOURCE: &'static str = "countries";

    fn criteria(&self) -> Vec<CountryCriterion> {
        let mut criteria = Vec::new();
        if let Some(v) = contains(&self.name) {
            criteria.push(CountryCriterion::Name(v));
        }
        if let Some(v) = code(&self.iso3) {
            criteria.push(CountryCriterion::Iso3(v));
        }
        if let Some(v) = code(&self.iso2) {
            criteria.push(CountryCriterion::Iso2(v));
        }
        if let Some(v) = contains(&self.currency) {
            criteria.push(CountryCriterion::Currency(v));
        }
        if let Some(v) = contains(&self.capital) {
            criteria.push(CountryCriterion::Capital(v));
        }
        if let Some(v) = contains(&self.region) {
            criteria.push(CountryCriterion::Region(v));
        }
        if let Some(v) = contains(&self.subregion) {
            criteria.push(CountryCriterion::Subregion(v));
        }
        if let Some(v) = contains(&self.nationality) {
            criteria.push(CountryCriterion::Nationality(v));
        }
        if let Some(v) = contains(&self.q) {
            criteria.push(CountryCriterion::Search(v));
        }
        criteria
    }

    fn page_request(&self) -> PageRequest {
        page_request(self.page, self.limit)
    }
}

// ============ States ============

/// Query filter for state listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, rename = "countryId", alias = "country_id", deserialize_with = "lenient_number")]
    pub country_id: Option<i32>,
    /// Free-text search across the searchable state fields.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<usize>,
}

/// A normalised state filter criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateCriterion {
    Name(String),
    StateCode(String),
    Kind(String),
    CountryId(i32),
    Search(String),
}

impl Criterion for StateCriterion {
    fn field(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::StateCode(_) => "state_code",
            Self::Kind(_) => "type",
            Self::CountryId(_) => "countryId",
            Self::Search(_) => "q",
        }
    }

    fn value(&self) -> String {
        match self {
            Self::Name(v) | Self::StateCode(v) | Self::Kind(v) | Self::Search(v) => v.clone(),
            Self::CountryId(id) => id.to_string(),
        }
    }
}

impl Filter for StateFilter {
    type Criterion = StateCriterion;

    const RESOURCE: &'static str = "states";

    fn criteria(&self) -> Vec<StateCriterion> {
        let mut criteria = Vec::new();
        if let Some(v) = contains(&self.name) {
            criteria.push(StateCriterion::Name(v));
        }
        if let Some(v) = contains(&self.state_code) {
            criteria.push(StateCriterion::StateCode(v));
        }
        if let Some(v) = contains(&self.kind) {
            criteria.push(StateCriterion::Kind(v));
        }
        if let Some(id) = self.country_id {
            criteria.push(StateCriterion::CountryId(id));
        }
        if let Some(v) = contains(&self.q) {
            criteria.push(StateCriterion::Search(v));
        }
        criteria
    }

    fn page_request(&self) -> PageRequest {
        page_request(self.page, self.limit)
    }
}

// ============ Cities ============

/// Query filter for city listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityFilter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "stateId", alias = "state_id", deserialize_with = "lenient_number")]
    pub state_id: Option<i32>,
    /// Free-text search across the searchable city fields.
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<usize>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<usize>,
}

/// A normalised city filter criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CityCriterion {
    Name(String),
    StateId(i32),
    Search(String),
}

impl Criterion for CityCriterion {
    fn field(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::StateId(_) => "stateId",
            Self::Search(_) => "q",
        }
    }

    fn value(&self) -> String {
        match self {
            Self::Name(v) | Self::Search(v) => v.clone(),
            Self::StateId(id) => id.to_string(),
        }
    }
}

impl Filter for CityFilter {
    type Criterion = CityCriterion;

    const RESOURCE: &'static str = "cities";

    fn criteria(&self) -> Vec<CityCriterion> {
        let mut criteria = Vec::new();
        if let Some(v) = contains(&self.name) {
            criteria.push(CityCriterion::Name(v));
        }
        if let Some(id) = self.state_id {
            criteria.push(CityCriterion::StateId(id));
        }
        if let Some(v) = contains(&self.q) {
            criteria.push(CityCriterion::Search(v));
        }
        criteria
    }

    fn page_request(&self) -> PageRequest {
        page_request(self.page, self.limit)
    }
}

// ============ Normalisation helpers ============

/// Substring criteria are matched case-insensitively, so they are folded to
/// lower case to share cache entries.
fn contains(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

/// ISO codes are matched exactly against the upper-cased input.
fn code(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_uppercase)
}

fn page_request(page: Option<usize>, limit: Option<usize>) -> PageRequest {
    PageRequest::new(page.unwrap_or(0), limit.unwrap_or(PageRequest::DEFAULT_LIMIT))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Accepts a number or numeric text; anything unparsable is treated as
/// absent rather than rejected.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
{
    let value = Option::<NumberOrText<T>>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_criteria_order_and_normalisation() {
        let filter = CountryFilter {
            q: Some("  Euro ".to_string()),
            iso2: Some("fr".to_string()),
            name: Some("FRANCE".to_string()),
            ..Default::default()
        };

        let criteria = filter.criteria();
        assert_eq!(
            criteria,
            vec![
                CountryCriterion::Name("france".to_string()),
                CountryCriterion::Iso2("FR".to_string()),
                CountryCriterion::Search("euro".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_values_are_absent() {
        let filter = CountryFilter {
            name: Some("   ".to_string()),
            capital: Some(String::new()),
            ..Default::default()
        };
        assert!(filter.criteria().is_empty());
    }

    #[test]
    fn test_state_criteria_include_country_id() {
        let filter = StateFilter {
            kind: Some("Province".to_string()),
            country_id: Some(14),
            ..Default::default()
        };
        let criteria = filter.criteria();
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].field(), "type");
        assert_eq!(criteria[1].field(), "countryId");
        assert_eq!(criteria[1].value(), "14");
    }

    #[test]
    fn test_default_page_request() {
        let filter = CityFilter::default();
        assert_eq!(filter.page_request(), PageRequest::new(0, PageRequest::DEFAULT_LIMIT));
    }

    #[test]
    fn test_lenient_numbers_from_json() {
        let filter: StateFilter =
            serde_json::from_str(r#"{"countryId":"12","page":"abc","limit":5}"#).unwrap();
        assert_eq!(filter.country_id, Some(12));
        assert_eq!(filter.page, None);
        assert_eq!(filter.limit, Some(5));
    }

    #[test]
    fn test_city_filter_accepts_snake_case_alias() {
        let filter: CityFilter = serde_json::from_str(r#"{"state_id":3}"#).unwrap();
        assert_eq!(filter.state_id, Some(3));
        assert_eq!(filter.criteria(), vec![CityCriterion::StateId(3)]);
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(CountryFilter::RESOURCE, "countries");
        assert_eq!(StateFilter::RESOURCE, "states");
        assert_eq!(CityFilter::RESOURCE, "cities");
    }
}
