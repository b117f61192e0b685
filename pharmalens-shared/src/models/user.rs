/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(255) NOT NULL UNIQUE,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Passwords are stored as Argon2id hashes, never in plaintext. Deleting
/// a user removes their scan history and reset tokens first, inside one
/// transaction; admin accounts cannot be deleted through this path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Authorization role for a user account
///
/// Exactly two values exist. New registrations always get `User`; `Admin`
/// comes only from the seed step or an explicit promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account: owns scans, sees only its own data
    User,

    /// Administrator: manages users, sees all scans
    Admin,
}

impl UserRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    /// Parses a role from its wire representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// User model representing an account row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Unique username
    pub username: String,

    /// Unique email address
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// Authorization role
    pub role: UserRole,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, safe to return to clients
///
/// Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,

    /// Argon2id password hash (NOT the plaintext password)
    pub password_hash: String,

    pub role: UserRole,
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username or email is already taken (unique
    /// constraint violation) or the database is unreachable.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username or email
    ///
    /// Login accepts either identifier in a single field.
    pub async fn find_by_username_or_email(
        pool: &PgPool,
        identifier: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE username = $1 OR email = $1
            "#,
        )
        .bind(identifier)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Checks whether a username or email is already taken
    pub async fn username_or_email_taken(
        pool: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<bool, sqlx::Error> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(pool)
        .await?;

        Ok(taken)
    }

    /// Updates a user's password hash
    ///
    /// Returns true if the user existed.
    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Updates a user's role
    ///
    /// Returns true if the user existed.
    pub async fn update_role(pool: &PgPool, id: Uuid, role: UserRole) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(role)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a non-admin user together with their scan history
    ///
    /// The user's scans and reset tokens are removed before the user row,
    /// inside one transaction. Admin rows are left untouched and the call
    /// reports false, matching the rule that admin accounts can never be
    /// deleted through the dashboard.
    ///
    /// Returns true if a user row was deleted.
    pub async fn delete_cascade(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM scan_history WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND role <> 'admin'")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all users, newest first, without password hashes
    pub async fn list_public(pool: &PgPool) -> Result<Vec<PublicUser>, sqlx::Error> {
        let users = sqlx::query_as::<_, PublicUser>(
            r#"
            SELECT id, username, email, role, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Counts accounts holding the regular `user` role
    pub async fn count_non_admin(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = 'user'")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
