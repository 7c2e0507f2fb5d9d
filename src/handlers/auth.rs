use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::token::Role,
    error::Result,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The request payload for login.
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "workId")]
    pub work_id: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

/// The data portion of a successful login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_id: Option<String>,
    /// Masked identity number; the cleartext never leaves the server here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_card: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub role: Role,
    pub token: String,
}

/// The response payload for login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub data: LoginData,
}

/// Handles login for both roles.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    tracing::info!("🔐 Login attempt: {} ({:?})", payload.work_id, payload.role);

    validate_principal(&payload.work_id)?;
    validate_password(&payload.password)?;

    let authenticated =
        auth_service::verify_login(&state, &payload.work_id, &payload.password, payload.role)
            .await?;

    let claims = &authenticated.claims;
    let response = LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        data: LoginData {
            work_id: claims.work_id.clone(),
            id_card: authenticated.id_card_masked.clone(),
            name: claims.name.clone(),
            department: claims.department.clone(),
            position_level: claims.position_level.clone(),
            username: claims.username.clone(),
            role: claims.role,
            token: authenticated.token,
        },
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
