/// Configuration management for the API server
///
/// Loads configuration from environment variables (a `.env` file is read
/// in development) into a type-safe struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `JWT_SECRET`: secret key for token signing, at least 32 chars (required)
/// - `OCR_SPACE_API_KEY`: OCR.space API key (required)
/// - `COHERE_API_KEY`: Cohere API key (required)
/// - `API_HOST` / `API_PORT`: bind address (default 0.0.0.0:3000)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default `*`)
/// - `PRODUCTION`: enables HSTS and strict CORS (default false)
/// - `PUBLIC_BASE_URL`: base URL used in password-reset links
/// - `UPLOAD_DIR` / `MAX_UPLOAD_BYTES`: upload storage (default uploads/, 10 MB)
/// - `STATIC_DIR`: directory holding the HTML pages (default static/)
/// - `DEBUG_EXPOSE_RESET_TOKEN`: include reset tokens in the
///   forgot-password response; testing convenience, keep off in production
/// - `SEED_ADMIN_USERNAME` / `SEED_ADMIN_EMAIL` / `SEED_ADMIN_PASSWORD`:
///   default admin account, seeded only when the password is set

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// OCR service configuration
    pub ocr: OcrConfig,

    /// AI analysis service configuration
    pub ai: AiConfig,

    /// Upload storage configuration
    pub upload: UploadConfig,

    /// Optional default admin seed
    pub seed_admin: Option<SeedAdminConfig>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` means permissive (development)
    pub cors_origins: Vec<String>,

    /// Production mode: HSTS on, strict CORS
    pub production: bool,

    /// Base URL clients reach the server at, used in reset links
    pub public_base_url: String,

    /// Directory holding the static HTML pages
    pub static_dir: String,

    /// Include the raw reset token/URL in forgot-password responses.
    /// Testing convenience only; must stay off in production.
    pub debug_expose_reset_token: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// OCR service configuration (OCR.space)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// API key
    pub api_key: String,

    /// Endpoint URL
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// AI analysis service configuration (Cohere)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// API key
    pub api_key: String,

    /// Endpoint URL
    pub endpoint: String,

    /// Generation model name
    pub model: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Directory uploaded images are written to and served from
    pub dir: String,

    /// Maximum accepted upload size in bytes
    pub max_file_size_bytes: usize,
}

/// Default admin account seeded at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or invalid.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()?;

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let production = env_flag("PRODUCTION");

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{}", api_port));

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

        let debug_expose_reset_token = env_flag("DEBUG_EXPOSE_RESET_TOKEN");

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let ocr_api_key = env::var("OCR_SPACE_API_KEY")
            .map_err(|_| anyhow::anyhow!("OCR_SPACE_API_KEY environment variable is required"))?;

        let ocr_endpoint = env::var("OCR_SPACE_ENDPOINT")
            .unwrap_or_else(|_| "https://api.ocr.space/parse/image".to_string());

        let ai_api_key = env::var("COHERE_API_KEY")
            .map_err(|_| anyhow::anyhow!("COHERE_API_KEY environment variable is required"))?;

        let ai_endpoint = env::var("COHERE_ENDPOINT")
            .unwrap_or_else(|_| "https://api.cohere.ai/v1/generate".to_string());

        let ai_model = env::var("COHERE_MODEL").unwrap_or_else(|_| "command".to_string());

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let max_upload_bytes = env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| (10 * 1024 * 1024).to_string())
            .parse::<usize>()?;

        // Seed only when a password is explicitly configured
        let seed_admin = env::var("SEED_ADMIN_PASSWORD").ok().map(|password| SeedAdminConfig {
            username: env::var("SEED_ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            email: env::var("SEED_ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@pharmalens.local".to_string()),
            password,
        });

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
                public_base_url,
                static_dir,
                debug_expose_reset_token,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            ocr: OcrConfig {
                api_key: ocr_api_key,
                endpoint: ocr_endpoint,
                timeout_seconds: 30,
            },
            ai: AiConfig {
                api_key: ai_api_key,
                endpoint: ai_endpoint,
                model: ai_model,
                timeout_seconds: 60,
            },
            upload: UploadConfig {
                dir: upload_dir,
                max_file_size_bytes: max_upload_bytes,
            },
            seed_admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Builds the password-reset URL for a token
    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password?token={}", self.api.public_base_url, token)
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
