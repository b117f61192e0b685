/// Request authentication context
///
/// The API server validates the `Authorization: Bearer <token>` header in
/// an Axum middleware layer and, on success, inserts an [`AuthContext`]
/// into the request extensions. Handlers extract it with Axum's
/// `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use pharmalens_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("Hello, {}!", auth.username)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::user::UserRole;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Username embedded in the token
    pub username: String,

    /// Role embedded in the token
    pub role: UserRole,
}

impl AuthContext {
    /// Creates an auth context from validated JWT claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            username: claims.username.clone(),
            role: claims.role,
        }
    }

    /// Whether this context carries the admin role
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Error type for authentication middleware
#[derive(Debug)]
pub enum AuthError {
    /// Missing authorization header
    MissingCredentials,

    /// Invalid authorization header format
    InvalidFormat(String),

    /// Token validation failed
    InvalidToken(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => {
                (StatusCode::UNAUTHORIZED, "Access token required".to_string())
            }
            AuthError::InvalidFormat(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        let body = Json(serde_json::json!({
            "error": "unauthorized",
            "message": message,
        }));

        (status, body).into_response()
    }
}
