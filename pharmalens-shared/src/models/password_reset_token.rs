/// Password-reset token model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE password_reset_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     token VARCHAR(128) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     used BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// A token authorizes exactly one password change: it must be unused and
/// unexpired at redemption time, and is marked used immediately after the
/// password hash is updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A password-reset token row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PasswordResetToken {
    /// Unique token ID
    pub id: Uuid,

    /// User the token was issued for
    pub user_id: Uuid,

    /// Random token string presented by the client
    pub token: String,

    /// Hard expiry; the token is dead afterwards even if never used
    pub expires_at: DateTime<Utc>,

    /// Whether the token has already authorized a reset
    pub used: bool,

    /// When the token was issued
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Persists a freshly generated token
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let row = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (user_id, token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token, expires_at, used, created_at
            "#,
        )
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    /// Looks up a token that is still valid
    ///
    /// Valid means: exists, `used = FALSE`, and `expires_at` in the
    /// future. Used or expired tokens return None even when the string
    /// matches.
    pub async fn find_valid(pool: &PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT id, user_id, token, expires_at, used, created_at
            FROM password_reset_tokens
            WHERE token = $1 AND used = FALSE AND expires_at > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Marks a token as consumed
    ///
    /// Returns true if the row existed.
    pub async fn mark_used(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE password_reset_tokens SET used = TRUE WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_serialization_shape() {
        let row = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token: "ab".repeat(32),
            expires_at: Utc::now(),
            used: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["used"], false);
        assert_eq!(json["token"].as_str().unwrap().len(), 64);
    }
}
