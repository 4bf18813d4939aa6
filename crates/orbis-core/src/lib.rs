//! # Orbis Core
//!
//! Core types shared by every layer of the Orbis geographic reference-data
//! service: the unified error model, pagination, domain entities, tagged
//! query filters and tracing initialisation.

pub mod domain;
pub mod error;
pub mod filter;
pub mod pagination;
pub mod result;
pub mod telemetry;

pub use domain::*;
pub use error::*;
pub use filter::*;
pub use pagination::*;
pub use result::*;
