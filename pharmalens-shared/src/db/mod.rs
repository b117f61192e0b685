/// Database layer for PharmaLens
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `migrations`: Embedded migration runner and the admin seed step
///
/// # Example
///
/// ```no_run
/// use pharmalens_shared::db::pool::{create_pool, DatabaseConfig};
/// use pharmalens_shared::db::migrations::run_migrations;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// };
///
/// let pool = create_pool(config).await?;
/// run_migrations(&pool).await?;
/// # Ok(())
/// # }
/// ```

pub mod migrations;
pub mod pool;
