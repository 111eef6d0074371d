//! Web server for Zephyr.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::{StorageConfig, WebConfig};
use crate::db::RefreshTokenRepository;
use crate::{Database, Result, ZephyrError};

use super::handlers::AppState;
use super::middleware::JwtState;
use super::router::{create_health_router, create_router};

/// Web server for the API.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// JWT state.
    jwt_state: Arc<JwtState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
}

impl WebServer {
    /// Create a new web server.
    pub fn new(config: &WebConfig, db: Arc<Database>, storage: StorageConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| {
                ZephyrError::Config(format!(
                    "invalid web server address {}:{}: {}",
                    config.host, config.port, e
                ))
            })?;

        let app_state = AppState::new(
            db,
            storage,
            &config.jwt_secret,
            config.jwt_access_token_expiry_secs,
            config.jwt_refresh_token_expiry_days,
        );

        Ok(Self {
            addr,
            app_state: Arc::new(app_state),
            jwt_state: Arc::new(JwtState::new(&config.jwt_secret)),
            cors_origins: config.cors_origins.clone(),
        })
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Start the hourly cleanup of expired and revoked refresh tokens.
    fn start_token_cleanup_task(db: Arc<Database>) {
        tokio::spawn(async move {
            const CLEANUP_INTERVAL_SECS: u64 = 3600;

            let mut interval = tokio::time::interval(Duration::from_secs(CLEANUP_INTERVAL_SECS));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match RefreshTokenRepository::new(db.pool()).cleanup_expired().await {
                    Ok(count) if count > 0 => {
                        tracing::info!(
                            deleted_count = count,
                            "Cleaned up expired/revoked refresh tokens"
                        );
                    }
                    Ok(_) => tracing::debug!("No expired refresh tokens to clean up"),
                    Err(e) => tracing::warn!(error = %e, "Failed to cleanup refresh tokens"),
                }
            }
        });
    }

    /// Make sure the storage root exists before accepting uploads.
    fn prepare_storage_root(&self) -> Result<()> {
        let root = &self.app_state.storage.root_path;
        std::fs::create_dir_all(root)?;
        tracing::info!("File storage root: {}", root);
        Ok(())
    }

    fn build_router(self) -> (Router, Arc<Database>, SocketAddr) {
        let db = self.app_state.db.clone();
        let router = create_router(self.app_state, self.jwt_state, &self.cors_origins)
            .merge(create_health_router())
            .layer(CompressionLayer::new());
        (router, db, self.addr)
    }

    async fn bind(self) -> Result<(TcpListener, Router)> {
        self.prepare_storage_root()?;
        let (router, db, addr) = self.build_router();

        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;

        // Start token cleanup background task after successful bind
        Self::start_token_cleanup_task(db);
        tracing::info!("Token cleanup task started (runs every hour)");
        tracing::info!("Web server listening on http://{}", local_addr);

        Ok((listener, router))
    }

    /// Run the web server.
    pub async fn run(self) -> Result<()> {
        let (listener, router) = self.bind().await?;
        axum::serve(listener, router).await?;
        Ok(())
    }

    /// Run the server in the background and return the bound address.
    ///
    /// Bind to port 0 to get a random free port.
    pub async fn run_with_addr(self) -> Result<SocketAddr> {
        let (listener, router) = self.bind().await?;
        let local_addr = listener.local_addr()?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    fn create_test_config() -> WebConfig {
        WebConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec![],
            jwt_secret: "test-secret-key".to_string(),
            jwt_access_token_expiry_secs: 900,
            jwt_refresh_token_expiry_days: 7,
        }
    }

    async fn create_server(temp: &TempDir, config: &WebConfig) -> Result<WebServer> {
        let db = Database::open_in_memory().await.unwrap();
        let storage = StorageConfig::with_root(temp.path().join("media").to_string_lossy());
        WebServer::new(config, Arc::new(db), storage)
    }

    #[tokio::test]
    async fn test_web_server_new() {
        let temp = TempDir::new().unwrap();
        let server = create_server(&temp, &create_test_config()).await.unwrap();
        assert_eq!(server.addr().ip().to_string(), "127.0.0.1");
    }

    #[tokio::test]
    async fn test_web_server_invalid_address() {
        let temp = TempDir::new().unwrap();
        let mut config = create_test_config();
        config.host = "not an address".to_string();

        let result = create_server(&temp, &config).await;
        assert!(matches!(result, Err(ZephyrError::Config(_))));
    }

    #[tokio::test]
    async fn test_web_server_run() {
        let temp = TempDir::new().unwrap();
        let server = create_server(&temp, &create_test_config()).await.unwrap();
        let addr = server.run_with_addr().await.unwrap();
        assert!(temp.path().join("media").is_dir());

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));

        // The compression layer may switch the body to chunked framing
        let (_, body) = response.split_once("\r\n\r\n").unwrap();
        assert!(body.contains("OK"));
    }
}
