//! # PharmaLens API Server
//!
//! Web application backend letting authenticated users photograph
//! medicine packaging, extract the text via OCR.space, get an
//! AI-generated explanation via Cohere, and browse their scan history.
//! Administrators manage users and see all scans.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p pharmalens-api
//! ```

use pharmalens_api::{
    app::{build_router, AppState},
    clients::{cohere::CohereClient, ocr::OcrClient},
    config::Config,
};
use pharmalens_shared::{
    auth::password,
    db::{migrations, pool},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pharmalens_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "PharmaLens API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;

    migrations::run_migrations(&db).await?;

    if let Some(seed) = &config.seed_admin {
        let password_hash = password::hash_password(&seed.password)?;
        migrations::seed_admin(&db, &seed.username, &seed.email, &password_hash).await?;
    }

    // The uploads directory must exist before the first scan comes in
    tokio::fs::create_dir_all(&config.upload.dir).await?;

    let ocr = OcrClient::new(&config.ocr);
    let ai = CohereClient::new(&config.ai);

    let bind_address = config.bind_address();
    let state = AppState::new(db, config, ocr, ai);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
