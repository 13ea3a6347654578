//! Error codes, the application error type and the JSON error body
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ApiResponse};
//!
//! let err = AppError::invalid_field("price", "price is required");
//! assert_eq!(err.code, ErrorCode::ValidationFailed);
//!
//! let body = ApiResponse::from(&err);
//! assert_eq!(body.code, 2);
//! ```

mod codes;
mod http;
mod types;

pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{ApiResponse, AppError, AppResult};
