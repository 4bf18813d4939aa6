//! PostgreSQL repository implementations.

mod geo_repository;

pub use geo_repository::PgGeoRepository;
