/// Bearer-token authentication
///
/// [`authenticate`] validates the `Authorization: Bearer <token>` header and
/// yields the [`AuthContext`] that the API's auth layer inserts into request
/// extensions for handlers to extract.
///
/// # Example
///
/// ```no_run
/// use axum::extract::Request;
/// use learnhub_shared::auth::middleware::authenticate;
///
/// fn whoami(req: &Request) -> String {
///     match authenticate(req, "your-jwt-secret") {
///         Ok(auth) => format!("Hello, {}!", auth.name),
///         Err(err) => err.to_string(),
///     }
/// }
/// ```

use axum::{extract::Request, http::header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::UserRole;

/// Authenticated caller, added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Email address from the session token
    pub email: String,

    /// Display name from the session token
    pub name: String,

    /// Role from the session token
    pub role: UserRole,

    /// Department from the session token
    pub department: Option<String>,
}

impl AuthContext {
    /// Creates auth context from validated JWT claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
            name: claims.name,
            role: claims.role,
            department: claims.department,
        }
    }

    /// Whether the caller holds the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the caller is `user_id` or an admin
    pub fn can_act_for(&self, user_id: Uuid) -> bool {
        self.user_id == user_id || self.is_admin()
    }
}

/// Reasons a request fails authentication
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing authorization header
    #[error("Missing authorization header")]
    MissingCredentials,

    /// Invalid authorization header format
    #[error("{0}")]
    InvalidFormat(String),

    /// Token validation failed
    #[error("{0}")]
    InvalidToken(String),
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer { .. } => AuthError::InvalidToken("Invalid token issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

/// Extracts and validates the bearer token from a request
pub fn authenticate(req: &Request, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_token(token.trim(), secret)?;

    Ok(AuthContext::from_claims(claims))
}
