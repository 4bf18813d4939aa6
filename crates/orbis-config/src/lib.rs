//! # Orbis Config
//!
//! Configuration management for Orbis.
//! Supports layered configuration from TOML files, `.env` files and
//! environment variables, validated once at startup.

mod app_config;
mod loader;
mod validation;

pub use app_config::*;
pub use loader::*;
pub use validation::*;
