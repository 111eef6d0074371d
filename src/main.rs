use std::sync::Arc;

use tracing::info;

use zephyr::web::WebServer;
use zephyr::{Config, Database};

#[tokio::main]
async fn main() -> zephyr::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    // Initialize logging
    if let Err(e) = zephyr::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        zephyr::logging::init_console_only(&config.logging.level);
    }

    config.validate()?;

    info!("Zephyr - multi-tenant file storage");
    let db = Database::open(&config.database.path).await?;

    let server = WebServer::new(&config.web, Arc::new(db), config.storage.clone())?;
    info!("Web API configured on {}", server.addr());
    server.run().await
}
