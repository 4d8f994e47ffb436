//! Tier handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::{PageQuery, tier_to_api};
use crate::infra::http::api::auth::Superuser;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn create_tier(
    State(state): State<ApiState>,
    _admin: Superuser,
    Json(payload): Json<TierCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let tier = state
        .tiers
        .create(payload.name.trim())
        .await
        .map_err(tier_to_api)?;

    Ok((StatusCode::CREATED, Json(tier)))
}

pub async fn list_tiers(
    State(state): State<ApiState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .tiers
        .list(query.request()?)
        .await
        .map_err(tier_to_api)?;

    Ok(Json(page))
}

pub async fn read_tier(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tier = state.tiers.find(&name).await.map_err(tier_to_api)?;
    Ok(Json(tier))
}

pub async fn update_tier(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path(name): Path<String>,
    Json(payload): Json<TierUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .tiers
        .rename(&name, payload.name.trim())
        .await
        .map_err(tier_to_api)?;

    Ok(Json(MessageResponse::new("Tier updated")))
}

pub async fn delete_tier(
    State(state): State<ApiState>,
    _admin: Superuser,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.tiers.delete(&name).await.map_err(tier_to_api)?;
    Ok(Json(MessageResponse::new("Tier deleted")))
}
