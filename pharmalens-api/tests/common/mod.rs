/// Common test utilities for integration tests
///
/// Shared infrastructure for tests that drive the full router against a
/// live PostgreSQL:
/// - Test database setup (migrations) and per-test accounts
/// - Bearer token generation
/// - Request helpers built on `tower::ServiceExt::oneshot`
///
/// Tests using this module need `DATABASE_URL` pointing at a disposable
/// database and are `#[ignore]`d by default.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use pharmalens_api::app::{build_router, AppState};
use pharmalens_api::clients::{cohere::CohereClient, ocr::OcrClient};
use pharmalens_api::config::{
    AiConfig, ApiConfig, Config, DatabaseConfig, JwtConfig, OcrConfig, UploadConfig,
};
use pharmalens_shared::auth::jwt::{create_token, Claims};
use pharmalens_shared::auth::password::hash_password;
use pharmalens_shared::db::migrations::run_migrations;
use pharmalens_shared::models::user::{CreateUser, User, UserRole};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub user_token: String,
    pub admin: User,
    pub admin_token: String,
}

fn test_config(database_url: String) -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
            public_base_url: "http://localhost:3000".to_string(),
            static_dir: "static".to_string(),
            // Tests read the reset token straight out of the response
            debug_expose_reset_token: true,
        },
        database: DatabaseConfig {
            url: database_url,
            max_connections: 5,
        },
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
        },
        ocr: OcrConfig {
            api_key: "test-ocr-key".to_string(),
            endpoint: "http://127.0.0.1:1/parse/image".to_string(),
            timeout_seconds: 1,
        },
        ai: AiConfig {
            api_key: "test-cohere-key".to_string(),
            endpoint: "http://127.0.0.1:1/generate".to_string(),
            model: "command".to_string(),
            timeout_seconds: 1,
        },
        upload: UploadConfig {
            dir: std::env::temp_dir()
                .join("pharmalens-test-uploads")
                .to_string_lossy()
                .into_owned(),
            max_file_size_bytes: 10 * 1024 * 1024,
        },
        seed_admin: None,
    }
}

impl TestContext {
    /// Creates a new test context with a fresh user and admin account
    pub async fn new() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL is required for integration tests"))?;

        let config = test_config(database_url);

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        let suffix = Uuid::new_v4();

        let user = User::create(
            &db,
            CreateUser {
                username: format!("user-{}", suffix),
                email: format!("user-{}@example.com", suffix),
                password_hash: hash_password("secret1")?,
                role: UserRole::User,
            },
        )
        .await?;

        let admin = User::create(
            &db,
            CreateUser {
                username: format!("admin-{}", suffix),
                email: format!("admin-{}@example.com", suffix),
                password_hash: hash_password("admin-secret")?,
                role: UserRole::Admin,
            },
        )
        .await?;

        let user_token = create_token(
            &Claims::new(user.id, user.username.clone(), user.role),
            &config.jwt.secret,
        )?;
        let admin_token = create_token(
            &Claims::new(admin.id, admin.username.clone(), admin.role),
            &config.jwt.secret,
        )?;

        let ocr = OcrClient::new(&config.ocr);
        let ai = CohereClient::new(&config.ai);
        let state = AppState::new(db.clone(), config.clone(), ocr, ai);
        let app = build_router(state);

        Ok(TestContext {
            db,
            app,
            config,
            user,
            user_token,
            admin,
            admin_token,
        })
    }

    /// Returns an authorization header value for the regular user
    pub fn user_auth(&self) -> String {
        format!("Bearer {}", self.user_token)
    }

    /// Returns an authorization header value for the admin
    pub fn admin_auth(&self) -> String {
        format!("Bearer {}", self.admin_token)
    }

    /// Sends a JSON request through the router and decodes the response
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Router should produce a response");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Body should collect")
            .to_bytes();

        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Removes the accounts this context created, and everything they own
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        for id in [self.user.id, self.admin.id] {
            sqlx::query("DELETE FROM scan_history WHERE user_id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;
            sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(&self.db)
                .await?;
        }
        Ok(())
    }
}
