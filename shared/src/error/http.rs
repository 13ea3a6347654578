//! HTTP status mapping

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::ValidationFailed | Self::UnsupportedFileFormat | Self::EmptyFile => {
                StatusCode::BAD_REQUEST
            }
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::NotFound | Self::ProductNotFound | Self::CategoryNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::AlreadyExists | Self::CategorySlugExists => StatusCode::CONFLICT,
            Self::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::FileStorageFailed | Self::InternalError | Self::DatabaseError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The failure is on our side (storage, database, bug), not the caller's
    pub fn is_server_fault(&self) -> bool {
        self.http_status().is_server_error()
    }
}
