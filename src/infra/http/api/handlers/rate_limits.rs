//! Tier rate limit rule handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::rate_limits::{CreateRateLimitCommand, UpdateRateLimitCommand};

use super::{PageQuery, rate_limit_to_api};
use crate::infra::http::api::auth::Superuser;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn create_rate_limit(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path(tier_name): Path<String>,
    Json(payload): Json<RateLimitCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateRateLimitCommand {
        name: payload.name,
        path: payload.path,
        limit: payload.limit,
        period: payload.period,
    };

    let rule = state
        .rate_limits
        .create(&tier_name, command)
        .await
        .map_err(rate_limit_to_api)?;

    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn list_rate_limits(
    State(state): State<ApiState>,
    Path(tier_name): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .rate_limits
        .list(&tier_name, query.request()?)
        .await
        .map_err(rate_limit_to_api)?;

    Ok(Json(page))
}

pub async fn read_rate_limit(
    State(state): State<ApiState>,
    Path((tier_name, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    let rule = state
        .rate_limits
        .get(&tier_name, id)
        .await
        .map_err(rate_limit_to_api)?;

    Ok(Json(rule))
}

pub async fn update_rate_limit(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path((tier_name, id)): Path<(String, i64)>,
    Json(payload): Json<RateLimitUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateRateLimitCommand {
        name: payload.name,
        path: payload.path,
        limit: payload.limit,
        period: payload.period,
    };

    state
        .rate_limits
        .update(&tier_name, id, command)
        .await
        .map_err(rate_limit_to_api)?;

    Ok(Json(MessageResponse::new("Rate Limit updated")))
}

pub async fn delete_rate_limit(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path((tier_name, id)): Path<(String, i64)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .rate_limits
        .delete(&tier_name, id)
        .await
        .map_err(rate_limit_to_api)?;

    Ok(Json(MessageResponse::new("Rate Limit deleted")))
}
