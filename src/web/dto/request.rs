//! Request DTOs for Web API.

use serde::Deserialize;
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Logout request.
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    /// Refresh token to invalidate.
    pub refresh_token: String,
}

/// Token refresh request.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token.
    pub refresh_token: String,
}

/// User registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Username, also the storage directory name.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub username: String,
    /// Password.
    #[validate(custom(function = "not_empty_trimmed"))]
    pub password: String,
    /// Nickname.
    #[validate(custom(function = "no_control_chars"))]
    pub nickname: String,
    /// Email (optional).
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Quota change (admin). `null` clears the quota.
#[derive(Debug, Deserialize, Validate)]
pub struct SetQuotaRequest {
    /// New quota in GiB.
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Quota must not be negative"))]
    pub quota_gb: Option<f64>,
}
