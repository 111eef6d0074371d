//! JWT authentication middleware.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::Role;
use crate::web::error::ApiError;

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: i64,
    /// Username.
    pub username: String,
    /// User role.
    pub role: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

impl JwtClaims {
    /// Role carried by the token. Unknown roles are treated as members.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or_default()
    }

    /// Fail with 403 unless the token belongs to an administrator.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role().can_access(Role::Admin) {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin access required"))
        }
    }
}

/// Application state for JWT authentication.
#[derive(Clone)]
pub struct JwtState {
    /// Decoding key for JWT verification.
    pub decoding_key: DecodingKey,
    /// Validation settings.
    pub validation: Validation,
}

impl JwtState {
    /// Create a new JWT state from a secret key.
    pub fn new(secret: &str) -> Self {
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Decode and validate a token.
    pub fn verify(&self, token: &str) -> Result<JwtClaims, ApiError> {
        decode::<JwtClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("JWT validation failed: {}", e);
                ApiError::unauthorized("Invalid or expired token")
            })
    }
}

/// Bearer token from the Authorization header, or else the `token` query
/// parameter (browser downloads cannot set headers). Request spans mask the
/// query value, see [`crate::logging::request_span`].
fn token_from_parts(parts: &Parts) -> Option<String> {
    let header_token = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|t| t.to_string());
    if header_token.is_some() {
        return header_token;
    }

    parts.uri.query()?.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key == "token" {
            urlencoding::decode(value).ok().map(|s| s.into_owned())
        } else {
            None
        }
    })
}

/// Extractor for authenticated users.
///
/// The handler receives the JWT claims if the token is valid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub JwtClaims);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let token = token_from_parts(parts)
                .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?;

            let jwt_state = parts
                .extensions
                .get::<Arc<JwtState>>()
                .ok_or_else(|| ApiError::internal("JWT state not configured"))?;

            Ok(AuthUser(jwt_state.verify(&token)?))
        })
    }
}

/// Middleware function to inject JWT state into request extensions.
pub async fn jwt_auth(
    jwt_state: Arc<JwtState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(jwt_state);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn claims(role: &str, exp_offset: i64) -> JwtClaims {
        let now = chrono::Utc::now().timestamp();
        JwtClaims {
            sub: 1,
            username: "testuser".to_string(),
            role: role.to_string(),
            iat: now as u64,
            exp: (now + exp_offset) as u64,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    fn create_test_token(secret: &str, claims: &JwtClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn parts_for(uri: &str, auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_verify_token() {
        let state = JwtState::new("test-secret");
        let token = create_test_token("test-secret", &claims("member", 3600));

        let decoded = state.verify(&token).unwrap();
        assert_eq!(decoded.sub, 1);
        assert_eq!(decoded.role(), Role::Member);
    }

    #[test]
    fn test_expired_token() {
        let state = JwtState::new("test-secret");
        let token = create_test_token("test-secret", &claims("member", -3600));
        assert!(state.verify(&token).is_err());
    }

    #[test]
    fn test_invalid_secret() {
        let token = create_test_token("secret1", &claims("member", 3600));
        assert!(JwtState::new("secret2").verify(&token).is_err());
    }

    #[test]
    fn test_require_admin() {
        assert!(claims("admin", 3600).require_admin().is_ok());
        assert!(claims("member", 3600).require_admin().is_err());
        assert!(claims("bogus", 3600).require_admin().is_err());
    }

    #[test]
    fn test_token_from_header_takes_precedence() {
        let parts = parts_for("/api/files/a.txt?token=query", Some("Bearer header"));
        assert_eq!(token_from_parts(&parts).as_deref(), Some("header"));
    }

    #[test]
    fn test_token_from_query() {
        let parts = parts_for("/api/files/a.txt?x=1&token=abc%2Edef", None);
        assert_eq!(token_from_parts(&parts).as_deref(), Some("abc.def"));

        let parts = parts_for("/api/files/a.txt", None);
        assert!(token_from_parts(&parts).is_none());
    }
}
