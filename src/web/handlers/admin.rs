//! Admin handlers: client listing, quota changes and client removal.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::storage::ClientUsage;
use crate::web::dto::{ApiResponse, QuotaResponse, SetQuotaRequest, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::AuthUser;

/// GET /api/admin/clients - List every client with its usage.
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<ClientUsage>>>, ApiError> {
    claims.require_admin()?;
    let clients = state.storage_service().list_clients().await?;
    Ok(Json(ApiResponse::new(clients)))
}

/// PUT /api/admin/clients/:id/quota - Set or clear a client's quota.
pub async fn set_quota(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<i64>,
    ValidatedJson(req): ValidatedJson<SetQuotaRequest>,
) -> Result<Json<ApiResponse<QuotaResponse>>, ApiError> {
    claims.require_admin()?;
    let profile = state
        .storage_service()
        .set_quota(user_id, req.quota_gb)
        .await?;

    tracing::info!(
        admin_id = claims.sub,
        user_id,
        quota_limit = ?profile.quota_limit,
        "Admin changed quota"
    );

    Ok(Json(ApiResponse::new(QuotaResponse {
        user_id,
        quota_limit: profile.quota_limit,
    })))
}

/// DELETE /api/admin/clients/:id - Remove a client and its files.
pub async fn remove_client(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    claims.require_admin()?;
    if user_id == claims.sub {
        return Err(ApiError::forbidden("You cannot remove your own account"));
    }

    state.storage_service().remove_client(user_id).await?;
    tracing::info!(admin_id = claims.sub, user_id, "Admin removed client");
    Ok(Json(ApiResponse::new(())))
}
