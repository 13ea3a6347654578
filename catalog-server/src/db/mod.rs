//! Catalog Store
//!
//! Durable SQLite storage for categories, products and admins.
//!
//! Lifecycle is explicit: [`CatalogStore::open`] connects and applies the
//! schema, [`CatalogStore::seed_defaults`] inserts the default rows, the store
//! is then handed to the repositories through `ServerState`, and
//! [`CatalogStore::close`] drains the pool on shutdown.
//!
//! Every write runs with `synchronous = FULL`, so a mutating statement has
//! been fsynced by the time it returns.

pub mod repository;
pub mod seed;

use crate::utils::AppError;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub use seed::{AdminSeed, DEFAULT_CATEGORIES};

/// Store handle - owns the SQLite connection pool
#[derive(Clone, Debug)]
pub struct CatalogStore {
    pool: SqlitePool,
}

impl CatalogStore {
    /// Open (creating if missing) the database at `db_path` and apply migrations
    pub async fn open(db_path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::database(format!("Failed to create database directory: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        tracing::info!(
            path = %db_path.display(),
            "Database connection established (SQLite WAL, synchronous=FULL)"
        );

        Self::from_pool(pool).await
    }

    /// Private in-memory database (single connection)
    pub async fn open_in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::database(format!("Invalid database path: {e}")))?
            .foreign_keys(true);

        // Every connection to :memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to apply migrations: {e}")))?;
        tracing::debug!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Insert default categories and the default admin if absent
    pub async fn seed_defaults(&self, admin: &AdminSeed) -> Result<(), AppError> {
        seed::seed_defaults(&self.pool, admin)
            .await
            .map_err(|e| AppError::database(format!("Failed to seed database: {e}")))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Round-trip a trivial statement (health check)
    pub async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }

    /// Close every connection; later calls fail with a database error
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database closed");
    }
}
