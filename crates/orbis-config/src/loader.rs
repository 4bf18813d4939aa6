//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use orbis_core::{OrbisError, OrbisResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Conventional variables honoured when the prefixed ones are absent.
const REDIS_URL_VAR: &str = "REDIS_URL";
const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// Configuration loader with runtime refresh support.
#[derive(Clone)]
pub struct ConfigLoader {
    config: Arc<RwLock<AppConfig>>,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Uncommitted local overrides
    /// 4. `REDIS_URL` / `DATABASE_URL`
    /// 5. Environment variables with `ORBIS_` prefix
    pub fn new(config_dir: impl Into<String>) -> OrbisResult<Self> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            config_dir,
        })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> OrbisResult<Self> {
        Self::new("./config")
    }

    /// Returns the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Reloads the configuration from disk.
    pub async fn reload(&self) -> OrbisResult<()> {
        let new_config = Self::load_config(&self.config_dir)?;
        let mut config = self.config.write().await;
        *config = new_config;
        info!("Configuration reloaded successfully");
        Ok(())
    }

    fn load_config(config_dir: &str) -> OrbisResult<AppConfig> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("ORBIS_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let mut config = Self::load_layers(config_dir, &environment)?;
        Self::apply_conventional_urls(&mut config);

        ConfigValidator::validate(&config).map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            OrbisError::Configuration(message)
        })?;

        info!(
            environment = %config.app.environment,
            redis_enabled = config.redis.enabled,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Builds the file and prefixed-environment layers for `environment`.
    pub fn load_layers(config_dir: &str, environment: &str) -> OrbisResult<AppConfig> {
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder()
            .set_default("app.environment", environment)
            .map_err(config_error_to_orbis_error)?;

        for name in ["default", environment, "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ORBIS")
                .separator("__")
                .try_parsing(true),
        );

        builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(config_error_to_orbis_error)
    }

    /// Applies `REDIS_URL` and `DATABASE_URL` unless the prefixed variables are set.
    fn apply_conventional_urls(config: &mut AppConfig) {
        if std::env::var_os("ORBIS_REDIS__URL").is_none() {
            if let Ok(url) = std::env::var(REDIS_URL_VAR) {
                debug!("Using {} for the cache store", REDIS_URL_VAR);
                config.redis.url = url;
            }
        }
        if std::env::var_os("ORBIS_DATABASE__URL").is_none() {
            if let Ok(url) = std::env::var(DATABASE_URL_VAR) {
                debug!("Using {} for the database", DATABASE_URL_VAR);
                config.database.url = url;
            }
        }
    }
}

fn config_error_to_orbis_error(err: ConfigError) -> OrbisError {
    OrbisError::Configuration(err.to_string())
}
