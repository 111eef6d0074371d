//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::logging;

use super::handlers::{
    browse_folder, dashboard, delete_file, delete_folder, download_file, list_clients, login,
    logout, me, refresh, register, remove_client, set_quota, upload_files, AppState,
};
use super::middleware::{create_cors_layer, jwt_auth, JwtState};

/// Create the main API router.
pub fn create_router(
    app_state: Arc<AppState>,
    jwt_state: Arc<JwtState>,
    cors_origins: &[String],
) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .route("/register", post(register))
        .route("/me", get(me));

    // Multipart bodies are capped by the configured upload size
    let upload_limit = app_state.storage.max_upload_bytes();
    let file_routes = Router::new()
        .route(
            "/files",
            post(upload_files).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/files/*path", get(download_file).delete(delete_file))
        .route("/folders/*path", get(browse_folder).delete(delete_folder));

    let admin_routes = Router::new()
        .route("/clients", get(list_clients))
        .route("/clients/:id", delete(remove_client))
        .route("/clients/:id/quota", put(set_quota));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .route("/dashboard", get(dashboard))
        .merge(file_routes)
        .nest("/admin", admin_routes);

    let jwt_state_for_middleware = jwt_state.clone();

    Router::new()
        .nest("/api", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http().make_span_with(logging::request_span))
                .layer(create_cors_layer(cors_origins))
                .layer(middleware::from_fn(move |req, next| {
                    let state = jwt_state_for_middleware.clone();
                    jwt_auth(state, req, next)
                })),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
