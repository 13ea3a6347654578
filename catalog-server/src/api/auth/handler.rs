//! Authentication Handlers

use axum::{Json, extract::State};
use serde::Serialize;
use shared::models::{AdminIdentity, LoginRequest, LoginResponse};

use crate::auth::{CurrentAdmin, password};
use crate::core::ServerState;
use crate::db::repository::admin;
use crate::security_log;
use crate::utils::{AppError, AppResult};

/// POST /api/auth/login
///
/// Same error for an unknown email and a wrong password.
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Email and password are required"));
    }

    let admin = admin::find_by_email(state.store.pool(), email).await?;
    let admin = match admin {
        Some(admin) if password::verify_password(&req.password, &admin.password) => admin,
        found => {
            let reason = if found.is_some() { "invalid_password" } else { "unknown_email" };
            security_log!(WARN, "login_failed", email = %email, reason = reason);
            return Err(AppError::invalid_credentials());
        }
    };

    let identity = AdminIdentity {
        id: admin.id,
        email: admin.email,
    };
    let token = state
        .jwt_service
        .generate_token(&identity)
        .map_err(|e| AppError::internal(e.to_string()))?;

    security_log!(INFO, "login_success", admin_id = identity.id);
    Ok(Json(LoginResponse {
        token,
        admin: identity,
    }))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub admin: AdminIdentity,
}

/// GET /api/auth/verify
pub async fn verify(admin: CurrentAdmin) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        valid: true,
        admin: admin.into(),
    })
}
