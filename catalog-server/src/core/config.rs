use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::db::AdminSeed;

const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:5174",
    "http://127.0.0.1:5173",
];

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | WORK_DIR | ./data | Base directory for the database and uploads |
/// | HTTP_PORT | 3001 | HTTP port |
/// | DATABASE_PATH | {WORK_DIR}/relux.db | SQLite database file |
/// | UPLOADS_DIR | {WORK_DIR}/uploads | Product image directory |
/// | ADMIN_EMAIL | admin@relux.com | Admin created on first start |
/// | ADMIN_PASSWORD | admin123 | Password of that admin |
/// | JWT_SECRET | (random per process) | HS256 signing secret |
/// | JWT_EXPIRATION_MINUTES | 1440 | Token lifetime |
/// | CORS_ORIGINS | localhost dev origins | Comma separated allowed origins |
/// | LOG_LEVEL | info | Default log level (`RUST_LOG` wins) |
/// | LOG_DIR | (unset) | Daily rolling log file directory |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/srv/relux HTTP_PORT=8080 JWT_SECRET=... catalog-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub work_dir: PathBuf,
    pub http_port: u16,
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    /// Admin seeded on first start
    pub admin: AdminSeed,
    pub jwt: JwtConfig,
    /// `JWT_SECRET` was unset and a per-process secret was generated
    pub ephemeral_secret: bool,
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let work_dir = PathBuf::from(var("WORK_DIR").unwrap_or_else(|| "./data".into()));
        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| work_dir.join("relux.db"));
        let uploads_dir = var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| work_dir.join("uploads"));

        let configured_secret = var("JWT_SECRET");
        let ephemeral_secret = configured_secret.is_none();
        let secret = configured_secret.unwrap_or_else(generate_secret);
        let expiration_minutes = var("JWT_EXPIRATION_MINUTES")
            .and_then(|v| v.parse().ok())
            .unwrap_or(1440);

        let cors_origins = var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect());

        Self {
            http_port: var("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_path,
            uploads_dir,
            admin: AdminSeed {
                email: var("ADMIN_EMAIL").unwrap_or_else(|| "admin@relux.com".into()),
                password: var("ADMIN_PASSWORD").unwrap_or_else(|| "admin123".into()),
            },
            jwt: JwtConfig::new(secret, expiration_minutes),
            ephemeral_secret,
            cors_origins,
            log_level: var("LOG_LEVEL").unwrap_or_else(|| "info".into()),
            log_dir: var("LOG_DIR"),
            work_dir,
        }
    }

    /// Defaults rooted at `work_dir`, ignoring the environment
    ///
    /// Used by tests.
    pub fn with_work_dir(work_dir: impl Into<PathBuf>) -> Self {
        let work_dir: PathBuf = work_dir.into();
        let work_dir = work_dir.to_string_lossy().into_owned();
        Self::from_lookup(|key| match key {
            "WORK_DIR" => Some(work_dir.clone()),
            "JWT_SECRET" => Some("test-secret-with-at-least-32-characters!".into()),
            _ => None,
        })
    }
}

fn generate_secret() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}
