//! User account handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::users::{CreateUserCommand, UpdateUserCommand};

use super::{PageQuery, user_to_api};
use crate::infra::http::api::auth::{CurrentUser, Superuser};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn create_user(
    State(state): State<ApiState>,
    Json(payload): Json<UserCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateUserCommand {
        name: payload.name,
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };

    let user = state.users.register(command).await.map_err(user_to_api)?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(
    State(state): State<ApiState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .users
        .list(query.request()?)
        .await
        .map_err(user_to_api)?;

    Ok(Json(page))
}

pub async fn read_current_user(current: CurrentUser) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(current.user))
}

pub async fn read_user(
    State(state): State<ApiState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .find_active(&username)
        .await
        .map_err(user_to_api)?;

    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<ApiState>,
    current: CurrentUser,
    Path(username): Path<String>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateUserCommand {
        name: payload.name,
        username: payload.username,
        email: payload.email,
        profile_image_url: payload.profile_image_url,
    };

    state
        .users
        .update(&current.user, &username, command)
        .await
        .map_err(user_to_api)?;

    Ok(Json(MessageResponse::new("User updated")))
}

pub async fn delete_user(
    State(state): State<ApiState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .delete(&current.user, &username, &current.token)
        .await
        .map_err(user_to_api)?;

    Ok(Json(MessageResponse::new("User deleted")))
}

pub async fn hard_delete_user(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .hard_delete(&username)
        .await
        .map_err(user_to_api)?;

    Ok(Json(MessageResponse::new("User deleted from the database")))
}

pub async fn read_user_rate_limits(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .with_rate_limits(&username)
        .await
        .map_err(user_to_api)?;

    Ok(Json(user))
}

pub async fn read_user_tier(
    State(state): State<ApiState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .users
        .with_tier(&username)
        .await
        .map_err(user_to_api)?;

    Ok(Json(user))
}

pub async fn update_user_tier(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path(username): Path<String>,
    Json(payload): Json<UserTierUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .users
        .set_tier(&username, payload.tier_id)
        .await
        .map_err(user_to_api)?;

    Ok(Json(MessageResponse::new("User Tier updated")))
}
