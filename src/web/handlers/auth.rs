//! Authentication handlers.

use axum::{extract::State, Json};
use jsonwebtoken::{encode, EncodingKey, Header};
use std::collections::HashMap;
use std::sync::Arc;

use crate::auth::{hash_password, validate_registration, verify_password, ValidationError};
use crate::config::StorageConfig;
use crate::db::{NewRefreshToken, NewUser, RefreshTokenRepository, User, UserRepository};
use crate::storage::StorageService;
use crate::web::dto::{
    ApiResponse, LoginRequest, LoginResponse, LogoutRequest, MeResponse, RefreshRequest,
    RefreshResponse, RegisterRequest, UserInfo, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::{AuthUser, JwtClaims};
use crate::Database;

/// Application state shared across handlers.
pub struct AppState {
    /// Database (the sqlx pool is internally synchronized).
    pub db: Arc<Database>,
    /// Storage root, default quota and upload limit.
    pub storage: StorageConfig,
    /// JWT encoding key.
    pub encoding_key: EncodingKey,
    /// Access token expiry in seconds.
    pub access_token_expiry: u64,
    /// Refresh token expiry in days.
    pub refresh_token_expiry: u64,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Arc<Database>,
        storage: StorageConfig,
        jwt_secret: &str,
        access_expiry: u64,
        refresh_expiry: u64,
    ) -> Self {
        Self {
            db,
            storage,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            access_token_expiry: access_expiry,
            refresh_token_expiry: refresh_expiry,
        }
    }

    /// Storage service bound to this state.
    pub fn storage_service(&self) -> StorageService<'_> {
        StorageService::new(&self.db, &self.storage)
    }

    /// Generate an access token for a user.
    pub fn generate_access_token(&self, user: &User) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = JwtClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role.as_str().to_string(),
            iat: now,
            exp: now + self.access_token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode JWT: {}", e);
            ApiError::internal("Failed to generate token")
        })
    }

    /// Generate and store a refresh token for a user.
    pub async fn issue_refresh_token(&self, user_id: i64) -> Result<String, ApiError> {
        let token = uuid::Uuid::new_v4().to_string();
        let expires_at =
            chrono::Utc::now() + chrono::Duration::days(self.refresh_token_expiry as i64);

        RefreshTokenRepository::new(self.db.pool())
            .create(&NewRefreshToken {
                user_id,
                token: token.clone(),
                expires_at: expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to store refresh token: {}", e);
                ApiError::internal("Failed to create session")
            })?;

        Ok(token)
    }

    /// Load the active account behind a token.
    pub async fn current_user(&self, claims: &JwtClaims) -> Result<User, ApiError> {
        let user = UserRepository::new(self.db.pool())
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::unauthorized("User not found"))?;

        if !user.is_active {
            return Err(ApiError::forbidden("Account is disabled"));
        }
        Ok(user)
    }

    async fn login_response(&self, user: User) -> Result<LoginResponse, ApiError> {
        let access_token = self.generate_access_token(&user)?;
        let refresh_token = self.issue_refresh_token(user.id).await?;

        Ok(LoginResponse {
            access_token,
            refresh_token,
            expires_in: self.access_token_expiry,
            user: UserInfo {
                id: user.id,
                role: user.role.to_string(),
                username: user.username,
                nickname: user.nickname,
            },
        })
    }
}

fn registration_error(err: ValidationError) -> ApiError {
    let field = match err {
        ValidationError::UsernameTooShort
        | ValidationError::UsernameTooLong
        | ValidationError::UsernameInvalidChars
        | ValidationError::UsernameReserved => "username",
        ValidationError::PasswordTooShort
        | ValidationError::PasswordTooLong
        | ValidationError::PasswordSameAsUsername => "password",
        ValidationError::NicknameEmpty
        | ValidationError::NicknameTooLong
        | ValidationError::NicknameInvalidChars => "nickname",
        ValidationError::EmailTooLong | ValidationError::EmailInvalidFormat => "email",
    };

    let mut details = HashMap::new();
    details.insert(field.to_string(), vec![err.to_string()]);
    ApiError::validation(details)
}

/// POST /api/auth/login - User login.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let users = UserRepository::new(state.db.pool());
    let user = users
        .get_by_username(&req.username)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    verify_password(&req.password, &user.password)
        .map_err(|_| ApiError::unauthorized("Invalid username or password"))?;

    if !user.is_active {
        return Err(ApiError::forbidden("Account is disabled"));
    }

    if let Err(e) = users.update_last_login(user.id).await {
        tracing::warn!(user_id = user.id, "Failed to update last login: {}", e);
    }

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");
    let response = state.login_response(user).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// POST /api/auth/logout - Revoke a refresh token.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let repo = RefreshTokenRepository::new(state.db.pool());
    if let Err(e) = repo.revoke(&req.refresh_token).await {
        tracing::warn!("Failed to revoke refresh token: {}", e);
    }

    Ok(Json(ApiResponse::new(())))
}

/// POST /api/auth/refresh - Rotate the refresh token and issue a new access token.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<RefreshResponse>>, ApiError> {
    let tokens = RefreshTokenRepository::new(state.db.pool());
    let stored = tokens
        .get_valid_token(&req.refresh_token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepository::new(state.db.pool())
        .get_by_id(stored.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if !user.is_active {
        return Err(ApiError::forbidden("Account is disabled"));
    }

    tokens.revoke(&req.refresh_token).await?;

    let response = RefreshResponse {
        access_token: state.generate_access_token(&user)?,
        refresh_token: state.issue_refresh_token(user.id).await?,
        expires_in: state.access_token_expiry,
    };

    Ok(Json(ApiResponse::new(response)))
}

/// POST /api/auth/register - Create an account and its storage profile.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let email = req.email.as_deref().filter(|e| !e.is_empty());
    validate_registration(&req.username, &req.password, &req.nickname, email)
        .map_err(registration_error)?;

    let users = UserRepository::new(state.db.pool());
    if users.username_exists(&req.username).await? {
        return Err(ApiError::conflict("Username already exists"));
    }

    let password_hash = hash_password(&req.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::internal("Failed to hash password")
    })?;

    let mut new_user = NewUser::new(&req.username, password_hash, &req.nickname);
    if let Some(email) = email {
        new_user = new_user.with_email(email);
    }
    let user = users.create(&new_user).await.map_err(|e| {
        if e.to_string().contains("UNIQUE") {
            ApiError::conflict("Username already exists")
        } else {
            tracing::error!("User creation failed: {}", e);
            ApiError::internal("Failed to create user")
        }
    })?;

    let profile = state.storage_service().profile_for(&user).await?;
    tracing::info!(
        user_id = user.id,
        username = %user.username,
        storage_path = %profile.storage_path,
        "User registered"
    );

    let response = state.login_response(user).await?;
    Ok(Json(ApiResponse::new(response)))
}

/// GET /api/auth/me - Current user info.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<MeResponse>>, ApiError> {
    let user = UserRepository::new(state.db.pool())
        .get_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let response = MeResponse {
        id: user.id,
        role: user.role.to_string(),
        username: user.username,
        nickname: user.nickname,
        email: user.email,
        created_at: user.created_at,
        last_login_at: user.last_login,
    };

    Ok(Json(ApiResponse::new(response)))
}
