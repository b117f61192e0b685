/// Bearer token generation and validation
///
/// PharmaLens authenticates API requests with a single kind of bearer
/// token: an HS256-signed JWT carrying the user's id, username, and role,
/// valid for 24 hours. There is no refresh flow; clients log in again when
/// the token expires.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: fixed 24 hours
/// - **Validation**: signature, expiration, not-before, and issuer checks
/// - **Secret Management**: the signing secret must be at least 32 bytes
///
/// # Example
///
/// ```
/// use pharmalens_shared::auth::jwt::{create_token, validate_token, Claims};
/// use pharmalens_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), UserRole::User);
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long!!")?;
///
/// let validated = validate_token(&token, "secret-key-at-least-32-bytes-long!!")?;
/// assert_eq!(validated.username, "alice");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserRole;

/// Issuer claim pinned on every token
const ISSUER: &str = "pharmalens";

/// Bearer tokens are valid for a fixed 24 hours
const TOKEN_LIFETIME_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid token issuer")]
    InvalidIssuer,
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "pharmalens")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `username`: display name echoed back to clients
/// - `role`: authorization role (`user` or `admin`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "pharmalens"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Username (custom claim)
    pub username: String,

    /// Role (custom claim)
    pub role: UserRole,
}

impl Claims {
    /// Creates new claims with the standard 24-hour expiry
    pub fn new(user_id: Uuid, username: String, role: UserRole) -> Self {
        Self::with_expiration(user_id, username, role, Duration::hours(TOKEN_LIFETIME_HOURS))
    }

    /// Creates claims with a custom expiry
    ///
    /// Used by tests to mint already-expired tokens; production code goes
    /// through [`Claims::new`].
    pub fn with_expiration(
        user_id: Uuid,
        username: String,
        role: UserRole,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            username,
            role,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed JWT from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// Verifies the signature, expiration, not-before time, and issuer.
///
/// # Errors
///
/// Returns `JwtError::Expired` for expired tokens, `JwtError::InvalidIssuer`
/// for a wrong issuer, and `JwtError::ValidationError` otherwise.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "alice".to_string(), UserRole::User);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.iss, "pharmalens");
        assert!(!claims.is_expired());
        // 24-hour lifetime
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "bob".to_string(), UserRole::Admin);
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.username, "bob");
        assert_eq!(validated.role, UserRole::Admin);
        assert_eq!(validated.iss, "pharmalens");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), UserRole::User);
        let token = create_token(&claims, "secret1").expect("Should create token");

        assert!(validate_token(&token, "wrong-secret").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            "alice".to_string(),
            UserRole::User,
            Duration::seconds(-3600), // expired an hour ago
        );

        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(matches!(result.unwrap_err(), JwtError::Expired));
    }

    #[test]
    fn test_registration_tokens_carry_user_role() {
        // Every freshly registered account is issued role `user`; admin
        // exists only via seeding or promotion.
        let claims = Claims::new(Uuid::new_v4(), "newcomer".to_string(), UserRole::User);
        let token = create_token(&claims, SECRET).unwrap();

        let validated = validate_token(&token, SECRET).unwrap();
        assert_eq!(validated.role, UserRole::User);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let claims = Claims::new(Uuid::new_v4(), "alice".to_string(), UserRole::User);
        let token = create_token(&claims, SECRET).unwrap();

        let mut tampered = token.clone();
        tampered.pop();
        tampered.push('A');

        assert!(validate_token(&tampered, SECRET).is_err());
    }
}
