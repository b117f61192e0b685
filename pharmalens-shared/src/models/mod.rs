/// Database models for PharmaLens
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: User accounts, roles, and authentication data
/// - `scan`: Scan history records (image + OCR text + AI analysis)
/// - `password_reset_token`: Single-use password-reset tokens
///
/// # Example
///
/// ```no_run
/// use pharmalens_shared::models::user::{User, CreateUser, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         username: "alice".to_string(),
///         email: "alice@example.com".to_string(),
///         password_hash: "$argon2id$...".to_string(),
///         role: UserRole::User,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod password_reset_token;
pub mod scan;
pub mod user;
