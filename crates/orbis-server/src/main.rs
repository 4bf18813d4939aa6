//! # Orbis Server
//!
//! Serves countries, states and cities from Postgres behind a
//! cache-aside layer.

use orbis_config::ConfigLoader;
use orbis_core::{telemetry::init_telemetry, OrbisResult};
use orbis_server::{startup::print_banner, Application};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Application error: {}", e);
        eprintln!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> OrbisResult<()> {
    let config_loader = ConfigLoader::from_default_location()?;
    let config = config_loader.get().await;

    init_telemetry(&config.observability.telemetry(&config.app.name))?;
    print_banner();

    info!("Starting {}...", config.app.name);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    let app = Application::build(config).await?;
    app.run().await
}
