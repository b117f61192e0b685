/// Database migration runner and seed step
///
/// Migrations live in the `migrations/` directory at the workspace root
/// and are embedded into the binary with sqlx's `migrate!` macro, so the
/// server applies pending migrations at startup without external tooling.
///
/// The seed step inserts the default admin account. Only a seeded or
/// later-promoted account ever holds the admin role; registration always
/// produces regular users.

use sqlx::postgres::PgPool;
use tracing::{info, warn};

use crate::models::user::UserRole;

/// Runs all pending database migrations
///
/// # Errors
///
/// Returns an error if a migration fails to apply; already-applied
/// migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Starting database migrations");

    let migrations = sqlx::migrate!("../migrations");

    match migrations.run(pool).await {
        Ok(()) => {
            info!("All database migrations completed successfully");
            Ok(())
        }
        Err(e) => {
            warn!("Migration failed: {}", e);
            Err(e)
        }
    }
}

/// Seeds the default admin account
///
/// Inserts an admin user unless the username or email already exists.
/// The password arrives pre-hashed; plaintext never reaches this layer.
///
/// Returns true if a new admin row was inserted.
pub async fn seed_admin(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(UserRole::Admin)
    .execute(pool)
    .await?;

    let inserted = result.rows_affected() > 0;
    if inserted {
        info!(username, "Seeded default admin account");
    }

    Ok(inserted)
}
