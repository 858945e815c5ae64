//! BITSA portal server binary.

use std::sync::Arc;

use bitsa::middleware::LoggingMiddleware;
use bitsa::routes::build_router;
use bitsa::{AppConfig, AppState, BitsaServer, Database};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}, using defaults", e);
        AppConfig::default()
    });

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    if let Err(e) = config.validate() {
        log::error!("configuration validation failed: {}", e);
        std::process::exit(1);
    }

    let db = Database::new_with_path(&config.database.path).await?;
    log::info!("database ready at {}", config.database.path);

    let addr = config.server_addr();
    let state = Arc::new(AppState::new(config, db));
    let router = build_router(&state);

    let server = BitsaServer::new(router, state).with_middleware(Box::new(LoggingMiddleware));

    server.run(&addr).await?;

    Ok(())
}
