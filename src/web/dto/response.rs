//! Response DTOs for Web API.

use serde::Serialize;

use crate::storage::{FileEntry, RejectedFile};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// Access token (JWT).
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiry in seconds.
    pub expires_in: u64,
    /// User information.
    pub user: UserInfo,
}

/// User information in responses.
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// Username.
    pub username: String,
    /// Nickname.
    pub nickname: String,
    /// User role.
    pub role: String,
}

/// Token refresh response.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// New refresh token.
    pub refresh_token: String,
    /// Expiry in seconds.
    pub expires_in: u64,
}

/// Current user response (for /api/auth/me).
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
}

/// Upload result.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Summary message.
    pub message: String,
    /// Files written.
    pub files: Vec<FileEntry>,
    /// Files skipped, with reasons.
    pub errors: Vec<RejectedFile>,
}

impl UploadResponse {
    /// Build the response, summarizing stored and skipped counts.
    pub fn new(files: Vec<FileEntry>, errors: Vec<RejectedFile>) -> Self {
        let message = match (files.len(), errors.len()) {
            (n, 0) => format!("{n} file(s) uploaded successfully."),
            (0, e) => format!("No files were uploaded; {e} file(s) were rejected."),
            (n, e) => format!("{n} file(s) uploaded successfully; {e} file(s) were rejected."),
        };
        Self {
            message,
            files,
            errors,
        }
    }
}

/// Delete result.
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Summary message.
    pub message: String,
    /// Index rows removed.
    pub records_removed: u64,
}

/// Quota after an admin change.
#[derive(Debug, Serialize)]
pub struct QuotaResponse {
    pub user_id: i64,
    /// Quota in bytes, `null` when unlimited.
    pub quota_limit: Option<i64>,
}
