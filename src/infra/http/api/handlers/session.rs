//! Login, token refresh and logout handlers

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use super::auth_to_api;
use crate::infra::http::api::auth::CurrentUser;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn login(
    State(state): State<ApiState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tokens = state
        .auth
        .login(payload.username.trim(), &payload.password)
        .await
        .map_err(auth_to_api)?;

    Ok(Json(tokens))
}

pub async fn refresh(
    State(state): State<ApiState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let token = state
        .auth
        .refresh(&payload.refresh_token)
        .await
        .map_err(auth_to_api)?;

    Ok(Json(token))
}

pub async fn logout(
    State(state): State<ApiState>,
    current: CurrentUser,
    payload: Option<Json<LogoutRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let refresh_token = payload.and_then(|Json(body)| body.refresh_token);
    state
        .auth
        .logout(&current.token, refresh_token.as_deref())
        .await
        .map_err(auth_to_api)?;

    Ok(Json(MessageResponse::new("Logged out successfully")))
}
