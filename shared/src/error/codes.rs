//! Unified error codes for the catalog
//!
//! Codes are grouped by range: 0xxx general, 1xxx auth, 6xxx catalog
//! (65xx for image uploads), 9xxx system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a plain `u16` so the storefront can branch on it without
/// parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 6xxx: Catalog ====================
    ProductNotFound = 6001,
    CategoryNotFound = 6101,
    CategorySlugExists = 6103,

    // ==================== 65xx: File Upload ====================
    FileTooLarge = 6501,
    UnsupportedFileFormat = 6502,
    EmptyFile = 6505,
    FileStorageFailed = 6509,

    // ==================== 9xxx: System ====================
    InternalError = 9001,
    DatabaseError = 9002,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Default human-readable message
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::CategoryNotFound => "Category not found",
            ErrorCode::CategorySlugExists => "A category with this slug already exists",

            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Only jpeg, jpg, png and webp images are allowed",
            ErrorCode::EmptyFile => "Empty file provided",
            ErrorCode::FileStorageFailed => "Failed to store file",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Returned when a `u16` does not name a known [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => ErrorCode::Success,
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            1001 => ErrorCode::NotAuthenticated,
            1002 => ErrorCode::InvalidCredentials,
            1003 => ErrorCode::TokenExpired,
            1004 => ErrorCode::TokenInvalid,
            6001 => ErrorCode::ProductNotFound,
            6101 => ErrorCode::CategoryNotFound,
            6103 => ErrorCode::CategorySlugExists,
            6501 => ErrorCode::FileTooLarge,
            6502 => ErrorCode::UnsupportedFileFormat,
            6505 => ErrorCode::EmptyFile,
            6509 => ErrorCode::FileStorageFailed,
            9001 => ErrorCode::InternalError,
            9002 => ErrorCode::DatabaseError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}
