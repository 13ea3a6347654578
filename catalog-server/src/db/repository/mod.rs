//! Repository Module
//!
//! Row-level CRUD over the catalog tables. Functions take the pool directly;
//! file side effects live one layer up in `services::CatalogService`.

pub mod admin;
pub mod category;
pub mod product;

use crate::utils::{AppError, ErrorCode};
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    return RepoError::Duplicate(db_err.message().to_string());
                }
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return RepoError::Validation("Referenced row does not exist".into());
                }
                sqlx::error::ErrorKind::CheckViolation => {
                    return RepoError::Validation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        RepoError::Database(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(msg) => AppError::with_message(ErrorCode::NotFound, msg),
            RepoError::Duplicate(msg) => AppError::conflict(msg),
            RepoError::Validation(msg) => AppError::validation(msg),
            RepoError::Database(msg) => AppError::database(msg),
        }
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;
