//! JWT Extractor
//!
//! Handlers that mutate the catalog take a [`CurrentAdmin`] argument, so a
//! request without a valid bearer token is rejected before the handler body
//! runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{CurrentAdmin, JwtError, JwtService};
use crate::core::ServerState;
use crate::security_log;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(admin) = parts.extensions.get::<CurrentAdmin>() {
            return Ok(admin.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => {
                security_log!(WARN, "auth_missing", uri = ?parts.uri);
                return Err(AppError::unauthorized());
            }
        };

        match state.jwt_service.validate_token(token) {
            Ok(claims) => {
                let admin = CurrentAdmin::try_from(claims)
                    .map_err(|e| AppError::invalid_token(e.to_string()))?;
                parts.extensions.insert(admin.clone());
                Ok(admin)
            }
            Err(e) => {
                security_log!(WARN, "auth_failed", error = %e, uri = ?parts.uri);
                match e {
                    JwtError::ExpiredToken => Err(AppError::token_expired()),
                    _ => Err(AppError::invalid_token("Invalid token")),
                }
            }
        }
    }
}
