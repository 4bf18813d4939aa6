//! # Orbis Server Library
//!
//! Wires configuration, the database pool, the cache store and the HTTP
//! router into a runnable application.

pub mod app;
pub mod startup;

pub use app::Application;
