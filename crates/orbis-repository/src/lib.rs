//! # Orbis Repository
//!
//! Read-only data access for the geographic reference data.
//!
//! ```text
//! Service
//!   ↓  Arc<dyn GeoRepository>   (domain interface)
//! PgGeoRepository               (SQLx query builder)
//!   ↓
//! PostgreSQL
//! ```

pub mod pool;
pub mod postgres;
pub mod traits;

pub use pool::*;
pub use postgres::*;
pub use traits::*;
