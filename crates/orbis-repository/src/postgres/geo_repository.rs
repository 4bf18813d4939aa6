//! PostgreSQL geographic repository implementation.

use crate::{traits::GeoRepository, DatabasePool};
use async_trait::async_trait;
use orbis_core::{
    City, CityCriterion, CityFilter, CityWithState, Country, CountryCriterion, CountryDetails,
    CountryFilter, CountrySummary, Filter, OrbisResult, Page, PageRequest, State, StateCriterion,
    StateFilter, StateSummary, StateWithCities, StateWithCountry, Timezone, Translation,
};
use sqlx::{FromRow, Postgres, QueryBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

const COUNTRY_COLUMNS: &str = "id, name, iso3, iso2, numeric_code, phonecode, capital, currency, \
     currency_name, currency_symbol, tld, native, region, region_id, subregion, subregion_id, \
     nationality, latitude, longitude, emoji, emoji_u";

const COUNTRY_SEARCH_COLUMNS: &[&str] = &[
    "name",
    "iso3",
    "iso2",
    "capital",
    "currency",
    "currency_name",
    "region",
    "subregion",
    "nationality",
];

const STATE_SEARCH_COLUMNS: &[&str] = &["s.name", "s.state_code", "s.type"];

const CITY_SEARCH_COLUMNS: &[&str] = &["ci.name"];

/// PostgreSQL geographic repository.
#[derive(Clone)]
pub struct PgGeoRepository {
    pool: Arc<DatabasePool>,
}

impl PgGeoRepository {
    /// Creates a new PostgreSQL geographic repository.
    #[must_use]
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self { pool }
    }

    async fn fetch_total(&self, mut query: QueryBuilder<'_, Postgres>) -> OrbisResult<u64> {
        let total: i64 = query.build_query_scalar().fetch_one(self.pool.inner()).await?;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}

/// Joined row for state listings.
#[derive(Debug, FromRow)]
struct StateRow {
    #[sqlx(flatten)]
    state: State,
    country_name: String,
    country_iso3: Option<String>,
    country_iso2: Option<String>,
}

impl From<StateRow> for StateWithCountry {
    fn from(row: StateRow) -> Self {
        let country = CountrySummary {
            id: row.state.country_id,
            name: row.country_name,
            iso3: row.country_iso3,
            iso2: row.country_iso2,
        };
        Self {
            state: row.state,
            country,
        }
    }
}

/// Joined row for city listings.
#[derive(Debug, FromRow)]
struct CityRow {
    #[sqlx(flatten)]
    city: City,
    state_name: String,
    state_code: Option<String>,
    country_id: i32,
    country_name: String,
    country_iso3: Option<String>,
    country_iso2: Option<String>,
}

impl From<CityRow> for CityWithState {
    fn from(row: CityRow) -> Self {
        let state = StateSummary {
            id: row.city.state_id,
            name: row.state_name,
            state_code: row.state_code,
            country: CountrySummary {
                id: row.country_id,
                name: row.country_name,
                iso3: row.country_iso3,
                iso2: row.country_iso2,
            },
        };
        Self {
            city: row.city,
            state,
        }
    }
}

// ============ WHERE clause builders ============

/// Escapes LIKE metacharacters and wraps the value for a substring match.
fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_contains(query: &mut QueryBuilder<'_, Postgres>, column: &str, value: &str) {
    query.push(" AND ").push(column).push(" ILIKE ");
    query.push_bind(like_pattern(value));
}

fn push_equals<T>(query: &mut QueryBuilder<'_, Postgres>, column: &str, value: T)
where
    T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
{
    query.push(" AND ").push(column).push(" = ");
    query.push_bind(value);
}

fn push_search(query: &mut QueryBuilder<'_, Postgres>, columns: &[&str], value: &str) {
    let pattern = like_pattern(value);
    query.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query.push(*column).push(" ILIKE ");
        query.push_bind(pattern.clone());
    }
    query.push(")");
}

fn push_page(query: &mut QueryBuilder<'_, Postgres>, page: PageRequest) {
    query.push(" LIMIT ");
    query.push_bind(i64::try_from(page.limit).unwrap_or(i64::MAX));
    query.push(" OFFSET ");
    query.push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
}

fn country_where(query: &mut QueryBuilder<'_, Postgres>, criteria: &[CountryCriterion]) {
    query.push(" WHERE 1 = 1");
    for criterion in criteria {
        match criterion {
            CountryCriterion::Name(v) => push_contains(query, "name", v),
            CountryCriterion::Iso3(v) => push_equals(query, "iso3", v.clone()),
            CountryCriterion::Iso2(v) => push_equals(query, "iso2", v.clone()),
            CountryCriterion::Currency(v) => push_contains(query, "currency", v),
            CountryCriterion::Capital(v) => push_contains(query, "capital", v),
            CountryCriterion::Region(v) => push_contains(query, "region", v),
            CountryCriterion::Subregion(v) => push_contains(query, "subregion", v),
            CountryCriterion::Nationality(v) => push_contains(query, "nationality", v),
            CountryCriterion::Search(v) => push_search(query, COUNTRY_SEARCH_COLUMNS, v),
        }
    }
}

fn state_where(query: &mut QueryBuilder<'_, Postgres>, criteria: &[StateCriterion]) {
    query.push(" WHERE 1 = 1");
    for criterion in criteria {
        match criterion {
            StateCriterion::Name(v) => push_contains(query, "s.name", v),
            StateCriterion::StateCode(v) => push_contains(query, "s.state_code", v),
            StateCriterion::Kind(v) => push_contains(query, "s.type", v),
            StateCriterion::CountryId(id) => push_equals(query, "s.country_id", *id),
            StateCriterion::Search(v) => push_search(query, STATE_SEARCH_COLUMNS, v),
        }
    }
}

fn city_where(query: &mut QueryBuilder<'_, Postgres>, criteria: &[CityCriterion]) {
    query.push(" WHERE 1 = 1");
    for criterion in criteria {
        match criterion {
            CityCriterion::Name(v) => push_contains(query, "ci.name", v),
            CityCriterion::StateId(id) => push_equals(query, "ci.state_id", *id),
            CityCriterion::Search(v) => push_search(query, CITY_SEARCH_COLUMNS, v),
        }
    }
}

const STATE_FROM: &str = " FROM states s JOIN countries c ON c.id = s.country_id";

const CITY_FROM: &str = " FROM cities ci \
     JOIN states s ON s.id = ci.state_id \
     JOIN countries c ON c.id = s.country_id";

#[async_trait]
impl GeoRepository for PgGeoRepository {
    async fn find_countries(&self, filter: &CountryFilter) -> OrbisResult<Page<Country>> {
        let criteria = filter.criteria();
        let page = filter.page_request();
        debug!(criteria = criteria.len(), page = page.page, limit = page.limit, "Finding countries");

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM countries");
        country_where(&mut count, &criteria);
        let total = self.fetch_total(count).await?;

        let mut select = QueryBuilder::new(format!("SELECT {} FROM countries", COUNTRY_COLUMNS));
        country_where(&mut select, &criteria);
        select.push(" ORDER BY name ASC, id ASC");
        push_page(&mut select, page);

        let countries = select
            .build_query_as::<Country>()
            .fetch_all(self.pool.inner())
            .await?;

        Ok(Page::new(countries, page, total))
    }

    async fn find_states(&self, filter: &StateFilter) -> OrbisResult<Page<StateWithCountry>> {
        let criteria = filter.criteria();
        let page = filter.page_request();
        debug!(criteria = criteria.len(), page = page.page, limit = page.limit, "Finding states");

        let mut count = QueryBuilder::new(format!("SELECT COUNT(*){}", STATE_FROM));
        state_where(&mut count, &criteria);
        let total = self.fetch_total(count).await?;

        let mut select = QueryBuilder::new(format!(
            "SELECT s.id, s.name, s.state_code, s.latitude, s.longitude, s.type, s.country_id, \
             c.name AS country_name, c.iso3 AS country_iso3, c.iso2 AS country_iso2{}",
            STATE_FROM
        ));
        state_where(&mut select, &criteria);
        select.push(" ORDER BY s.name ASC, s.id ASC");
        push_page(&mut select, page);

        let rows = select
            .build_query_as::<StateRow>()
            .fetch_all(self.pool.inner())
            .await?;

        Ok(Page::new(rows, page, total).map(StateWithCountry::from))
    }

    async fn find_cities(&self, filter: &CityFilter) -> OrbisResult<Page<CityWithState>> {
        let criteria = filter.criteria();
        let page = filter.page_request();
        debug!(criteria = criteria.len(), page = page.page, limit = page.limit, "Finding cities");

        let mut count = QueryBuilder::new(format!("SELECT COUNT(*){}", CITY_FROM));
        city_where(&mut count, &criteria);
        let total = self.fetch_total(count).await?;

        let mut select = QueryBuilder::new(format!(
            "SELECT ci.id, ci.name, ci.latitude, ci.longitude, ci.state_id, \
             s.name AS state_name, s.state_code, s.country_id, \
             c.name AS country_name, c.iso3 AS country_iso3, c.iso2 AS country_iso2{}",
            CITY_FROM
        ));
        city_where(&mut select, &criteria);
        select.push(" ORDER BY ci.name ASC, ci.id ASC");
        push_page(&mut select, page);

        let rows = select
            .build_query_as::<CityRow>()
            .fetch_all(self.pool.inner())
            .await?;

        Ok(Page::new(rows, page, total).map(CityWithState::from))
    }

    async fn find_country_details(&self, id: i32) -> OrbisResult<Option<CountryDetails>> {
        debug!("Finding country details by id: {}", id);

        let country = sqlx::query_as::<_, Country>(&format!(
            "SELECT {} FROM countries WHERE id = $1",
            COUNTRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        let Some(country) = country else {
            return Ok(None);
        };

        let states = sqlx::query_as::<_, State>(
            r#"
            SELECT id, name, state_code, latitude, longitude, type, country_id
            FROM states
            WHERE country_id = $1
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(id)
        .fetch_all(self.pool.inner())
        .await?;

        let state_ids: Vec<i32> = states.iter().map(|s| s.id).collect();
        let cities = sqlx::query_as::<_, City>(
            r#"
            SELECT id, name, latitude, longitude, state_id
            FROM cities
            WHERE state_id = ANY($1)
            ORDER BY name ASC, id ASC
            "#,
        )
        .bind(state_ids.as_slice())
        .fetch_all(self.pool.inner())
        .await?;

        let mut cities_by_state: HashMap<i32, Vec<City>> = HashMap::new();
        for city in cities {
            cities_by_state.entry(city.state_id).or_default().push(city);
        }

        let states = states
            .into_iter()
            .map(|state| {
                let cities = cities_by_state.remove(&state.id).unwrap_or_default();
                StateWithCities { state, cities }
            })
            .collect();

        let timezones = sqlx::query_as::<_, Timezone>(
            r#"
            SELECT id, zone_name, gmt_offset, gmt_offset_name, abbreviation, tz_name, country_id
            FROM timezones
            WHERE country_id = $1
            ORDER BY id ASC
            "#,
        )
        .bind(id)
        .fetch_all(self.pool.inner())
        .await?;

        let translations = sqlx::query_as::<_, Translation>(
            r#"
            SELECT id, country_id, ko, pt_br, pt, nl, hr, fa, de, es, fr, ja, it, zh_cn, tr, ru, uk, pl
            FROM translations
            WHERE country_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.inner())
        .await?;

        Ok(Some(CountryDetails {
            country,
            states,
            timezones,
            translations,
        }))
    }
}
