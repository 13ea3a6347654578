//! Relux Catalog Server - product catalog for a leather-goods shop
//!
//! # Module structure
//!
//! ```text
//! catalog-server/src/
//! ├── core/          # config, state, HTTP server
//! ├── auth/          # JWT + Argon2, admin extractor
//! ├── db/            # SQLite store, seed data, repositories
//! ├── services/      # catalog service, image store
//! ├── pricing/       # effective price, cart totals
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, slugs, error re-exports
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod pricing;
pub mod services;
pub mod utils;

pub use auth::{CurrentAdmin, JwtService};
pub use core::{Config, Server, ServerState};
pub use db::CatalogStore;
pub use services::CatalogService;
pub use utils::{ApiResponse, AppError, AppResult, ErrorCode};

pub use utils::logger::init_logger_with_file;

/// Security event logging (target `security`)
///
/// `security_log!(WARN, "auth_failed", error = %e, uri = ?parts.uri)`
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(target: "security", event = $event, $($arg)*)
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(target: "security", event = $event, $($arg)*)
    };
}

/// Load `.env`, read the config and initialize logging from it
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    config
}
