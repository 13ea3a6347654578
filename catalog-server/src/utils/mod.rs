//! Utilities - shared error aliases, logging and slug derivation
//!
//! - [`AppError`] / [`AppResult`] - application error type (from shared::error)
//! - [`logger`] - tracing subscriber setup
//! - [`slug`] - URL-safe slugs from display names

pub mod logger;
pub mod slug;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use slug::slugify;
