/// Application state and router builder
///
/// This module defines the shared application state and provides a
/// function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use pharmalens_api::app::{build_router, AppState};
/// use pharmalens_api::clients::{cohere::CohereClient, ocr::OcrClient};
/// use pharmalens_api::config::Config;
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let ocr = OcrClient::new(&config.ocr);
/// let ai = CohereClient::new(&config.ai);
/// let state = AppState::new(pool, config, ocr, ai);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    clients::{cohere::CohereClient, ocr::OcrClient},
    config::Config,
    middleware::security::SecurityHeadersLayer,
    routes,
};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use pharmalens_shared::auth::{authorization, jwt, middleware::AuthContext};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Cheap
/// to clone: the config is behind an Arc and both clients wrap an
/// internally reference-counted reqwest client.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// OCR service client
    pub ocr: OcrClient,

    /// AI analysis service client
    pub ai: CohereClient,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, ocr: OcrClient, ai: CohereClient) -> Self {
        Self {
            db,
            config: Arc::new(config),
            ocr,
            ai,
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// ├── /api/auth/                     # Authentication
/// │   ├── POST /register             # public
/// │   ├── POST /login                # public
/// │   ├── POST /forgot-password      # public
/// │   ├── POST /reset-password       # public
/// │   ├── GET  /me                   # bearer
/// │   └── POST /logout               # bearer
/// ├── /api/scan/                     # Scan pipeline (bearer)
/// │   ├── POST /                     # submit scan
/// │   ├── GET  /history
/// │   └── GET  /:id
/// ├── /api/dashboard/                # Dashboard (bearer)
/// │   ├── GET    /stats
/// │   ├── GET    /recent-scans
/// │   ├── GET    /users              # admin
/// │   ├── GET    /all-scans          # admin
/// │   ├── DELETE /users/:id          # admin
/// │   └── PUT    /users/:id/role     # admin
/// ├── /, /login, /scan, /history, /admin, /reset-password  # HTML pages
/// └── /uploads/*                     # stored scan images
/// ```
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth routes
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password", post(routes::auth::reset_password));

    // Auth routes that need a valid token
    let auth_protected = Router::new()
        .route("/me", get(routes::auth::me))
        .route("/logout", post(routes::auth::logout))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Scan pipeline routes (bearer auth + upload size cap)
    let scan_routes = Router::new()
        .route("/", post(routes::scan::submit_scan))
        .route("/history", get(routes::scan::history))
        .route("/:id", get(routes::scan::get_scan))
        // multipart framing adds overhead on top of the file itself
        .layer(DefaultBodyLimit::max(
            state.config.upload.max_file_size_bytes + 1024 * 1024,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Dashboard routes available to every authenticated user
    let dashboard_user = Router::new()
        .route("/stats", get(routes::dashboard::stats))
        .route("/recent-scans", get(routes::dashboard::recent_scans));

    // Admin-only dashboard routes: the role check runs after the jwt
    // layer has installed the AuthContext
    let dashboard_admin = Router::new()
        .route("/users", get(routes::dashboard::list_users))
        .route("/users/:id", delete(routes::dashboard::delete_user))
        .route("/users/:id/role", put(routes::dashboard::update_user_role))
        .route("/all-scans", get(routes::dashboard::all_scans))
        .layer(axum::middleware::from_fn(admin_layer));

    let dashboard_routes = dashboard_user.merge(dashboard_admin).layer(
        axum::middleware::from_fn_with_state(state.clone(), jwt_auth_layer),
    );

    // Static pages and uploaded images
    let page_routes = routes::pages::router(&state.config.api.static_dir, &state.config.upload.dir);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    let static_dir = state.config.api.static_dir.clone();

    Router::new()
        .merge(health_routes)
        .nest("/api/auth", auth_public.merge(auth_protected))
        .nest("/api/scan", scan_routes)
        .nest("/api/dashboard", dashboard_routes)
        .merge(page_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer-token authentication middleware
///
/// Extracts and validates the JWT from the Authorization header, then
/// injects an [`AuthContext`] into the request extensions.
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Access token required".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    req.extensions_mut().insert(AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

/// Admin role-check middleware
///
/// Runs inside the jwt layer, so the AuthContext is always present by
/// the time this executes.
async fn admin_layer(req: Request, next: Next) -> Result<Response, crate::error::ApiError> {
    let auth = req
        .extensions()
        .get::<AuthContext>()
        .cloned()
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Access token required".to_string())
        })?;

    authorization::require_admin(&auth)?;

    Ok(next.run(req).await)
}
