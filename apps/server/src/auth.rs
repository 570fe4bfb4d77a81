//! JWT authentication module.
//!
//! Bearer tokens carry the user id and role. Login lives elsewhere; this
//! server only verifies tokens (and can mint them for tests and tooling).

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};
use stockwise_core::Role;
use uuid::Uuid;

use crate::error::{ApiError, ErrorCode};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,

    pub role: Role,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,
}

/// The caller behind a verified token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
    pub role: Role,
}

/// Handlers take the caller the access guard resolved.
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or_else(ApiError::unauthorized)
    }
}

/// JWT token manager.
#[derive(Clone)]
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("lifetime_secs", &self.lifetime_secs)
            .finish_non_exhaustive()
    }
}

impl JwtManager {
    /// Create a new JWT manager (HS256).
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        JwtManager {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    /// Generate a token for a user.
    pub fn generate_token(&self, user_id: i64, role: Role) -> Result<String, ApiError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to generate token: {}", e)))
    }

    /// Validate and decode a token.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ApiError> {
        let token_data: TokenData<Claims> = decode(token, &self.decoding, &Validation::default())
            .map_err(|e| ApiError::new(ErrorCode::Unauthorized, format!("Invalid token: {}", e)))?;

        Ok(token_data.claims)
    }

    /// Validates a token and resolves the caller.
    pub fn authenticate(&self, token: &str) -> Result<AuthUser, ApiError> {
        let claims = self.validate_token(token)?;
        let user_id = claims.sub.parse().map_err(|_| {
            ApiError::new(ErrorCode::Unauthorized, "Invalid token subject")
        })?;

        Ok(AuthUser {
            user_id,
            role: claims.role,
        })
    }

    /// Resolves the caller from the `Authorization` header.
    ///
    /// A missing, malformed or expired token means "not signed in".
    pub fn caller(&self, headers: &HeaderMap) -> Option<AuthUser> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = extract_bearer_token(value)?;

        match self.authenticate(token) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::debug!(error = %err.message, "Ignoring bearer token");
                None
            }
        }
    }
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test-secret-0123456789", 3600);

        let token = manager.generate_token(42, Role::Manager).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.role, Role::Manager);
        assert_eq!(
            manager.authenticate(&token).unwrap(),
            AuthUser {
                user_id: 42,
                role: Role::Manager
            }
        );
    }

    #[test]
    fn test_wrong_secret_and_expiry() {
        let issuer = JwtManager::new("issuer-secret-0123456789", 3600);
        let verifier = JwtManager::new("another-secret-0123456789", 3600);
        let token = issuer.generate_token(1, Role::Admin).unwrap();
        assert!(verifier.validate_token(&token).is_err());

        // Past the default 60s leeway.
        let expired = JwtManager::new("issuer-secret-0123456789", -120);
        let token = expired.generate_token(1, Role::Admin).unwrap();
        assert!(issuer.validate_token(&token).is_err());
    }

    #[test]
    fn test_caller_from_headers() {
        let manager = JwtManager::new("test-secret-0123456789", 3600);
        let token = manager.generate_token(7, Role::Staff).unwrap();

        let mut headers = HeaderMap::new();
        assert_eq!(manager.caller(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert_eq!(manager.caller(&headers).map(|u| u.role), Some(Role::Staff));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer nope"));
        assert_eq!(manager.caller(&headers), None);
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
    }
}
