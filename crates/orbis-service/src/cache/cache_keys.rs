//! Cache key generators for consistent key naming.
//!
//! Listing keys look like `countries:name=france|iso2=FR|page=0|limit=10`:
//! the resource prefix, then each present criterion in declaration order,
//! then the page. Values are percent-escaped so that no two filters share a
//! key and no value can smuggle glob metacharacters into a pattern.

use orbis_core::{Criterion, Filter};

/// Prefix for country details keys.
const COUNTRY_DETAILS_PREFIX: &str = "country";

/// Generate the cache key for a listing filter.
#[must_use]
pub fn listing_key<F: Filter>(filter: &F) -> String {
    let page = filter.page_request();
    let mut parts: Vec<String> = filter
        .criteria()
        .iter()
        .map(|criterion| format!("{}={}", criterion.field(), escape(&criterion.value())))
        .collect();
    parts.push(format!("page={}", page.page));
    parts.push(format!("limit={}", page.limit));

    format!("{}:{}", F::RESOURCE, parts.join("|"))
}

/// Generate the cache key for one country's details.
#[must_use]
pub fn country_details(id: i32) -> String {
    format!("{}:{}:details", COUNTRY_DETAILS_PREFIX, id)
}

/// Pattern matching every listing key of one resource.
#[must_use]
pub fn resource_pattern<F: Filter>() -> String {
    format!("{}:*", F::RESOURCE)
}

/// Pattern matching every country details key.
#[must_use]
pub fn country_details_pattern() -> String {
    format!("{}:*", COUNTRY_DETAILS_PREFIX)
}

/// Every pattern a data reload has to invalidate.
#[must_use]
pub fn geo_patterns() -> Vec<String> {
    vec![
        resource_pattern::<orbis_core::CountryFilter>(),
        resource_pattern::<orbis_core::StateFilter>(),
        resource_pattern::<orbis_core::CityFilter>(),
        country_details_pattern(),
    ]
}

/// Percent-escapes key separators and glob metacharacters.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '%' | '|' | '=' | ':' | '*' | '?' | '[' | ']' | '\\' => {
                escaped.push_str(&format!("%{:02X}", c as u32));
            }
            other => escaped.push(other),
        }
    }
    escaped
}
