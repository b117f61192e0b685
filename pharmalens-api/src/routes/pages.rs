/// Static page and upload serving
///
/// The HTML pages live in the static directory and are served as-is; the
/// page content itself is plain client-side markup and out of scope here.
/// Uploaded scan images are served back under `/uploads` so the history
/// page can display them.

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::app::AppState;

/// Builds the static-page router
///
/// Routes `/`, `/login`, `/scan`, `/history`, `/admin`, and
/// `/reset-password` to their HTML files, and exposes the uploads
/// directory under `/uploads`.
pub fn router(static_dir: &str, upload_dir: &str) -> Router<AppState> {
    let page = |file: &str| ServeFile::new(format!("{}/{}", static_dir, file));

    Router::new()
        .route_service("/", page("index.html"))
        .route_service("/login", page("login.html"))
        .route_service("/scan", page("scan.html"))
        .route_service("/history", page("history.html"))
        .route_service("/admin", page("admin.html"))
        .route_service("/reset-password", page("reset-password.html"))
        .nest_service("/uploads", ServeDir::new(upload_dir))
}
