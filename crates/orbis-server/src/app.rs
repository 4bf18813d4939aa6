//! Application assembly.
//!
//! Builds every component from an [`AppConfig`] with plain constructor
//! injection and owns them until shutdown.

use crate::startup::{print_startup_info, shutdown_signal};
use axum::Router;
use orbis_config::{AppConfig, RedisConfig};
use orbis_core::{OrbisError, OrbisResult};
use orbis_repository::{create_pool, DatabasePool, PgGeoRepository};
use orbis_resilience::RetryPolicy;
use orbis_rest::{create_router, AppState};
use orbis_service::{
    CacheAside, CacheStore, GeoService, GeoServiceImpl, InMemoryCacheStore, RedisCacheStore, Ttl,
};
use std::sync::Arc;
use tracing::info;

/// A fully wired application, ready to serve.
pub struct Application {
    config: AppConfig,
    db_pool: Arc<DatabasePool>,
    cache: CacheAside,
    router: Router,
}

impl Application {
    /// Connects to Postgres and the cache store and builds the router.
    ///
    /// Fails when either backend cannot be reached, or when a configured
    /// TTL expression does not parse.
    pub async fn build(config: AppConfig) -> OrbisResult<Self> {
        check_ttls(&config)?;

        let db_pool = RetryPolicy::default()
            .execute_when(|| create_pool(&config.database), OrbisError::is_retriable)
            .await?;
        if config.database.run_migrations {
            db_pool.run_migrations().await?;
        }

        let store = build_cache_store(&config.redis)?;
        store.connect().await?;
        info!(backend = store.backend(), "Cache store connected");

        let cache = CacheAside::new(store);
        let repository = Arc::new(PgGeoRepository::new(Arc::clone(&db_pool)));
        let geo_service: Arc<dyn GeoService> = Arc::new(GeoServiceImpl::new(
            repository,
            cache.clone(),
            &config.cache,
        ));

        let router = create_router(AppState::new(geo_service, cache.clone()), &config.server);

        Ok(Self {
            config,
            db_pool,
            cache,
            router,
        })
    }

    /// Returns the HTTP router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Returns the cache-aside handle shared with the services.
    pub fn cache(&self) -> &CacheAside {
        &self.cache
    }

    /// Serves HTTP until a shutdown signal arrives, then releases the
    /// cache connection and the database pool.
    pub async fn run(self) -> OrbisResult<()> {
        let addr = self.config.server.addr();
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| OrbisError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

        print_startup_info(&addr, self.cache.store().backend());

        let served = axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| OrbisError::Internal(format!("HTTP server error: {}", e)));

        self.shutdown().await;
        served
    }

    async fn shutdown(&self) {
        info!("Releasing backing services");
        self.cache.store().disconnect().await;
        self.db_pool.close().await;
        info!("Server shutdown complete");
    }
}

/// Picks the cache backend named by the configuration.
pub fn build_cache_store(config: &RedisConfig) -> OrbisResult<Arc<dyn CacheStore>> {
    if config.enabled {
        Ok(Arc::new(RedisCacheStore::new(config)?))
    } else {
        info!("Redis disabled, using the in-process cache store");
        Ok(Arc::new(InMemoryCacheStore::new(config.scan_batch_size)))
    }
}

fn check_ttls(config: &AppConfig) -> OrbisResult<()> {
    for expression in [&config.cache.listing_ttl, &config.cache.details_ttl] {
        Ttl::from(expression.as_str()).resolve()?;
    }
    Ok(())
}
