//! Partition handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::partitions::{CreatePartitionCommand, UpdatePartitionCommand};

use super::{SkipLimitQuery, partition_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::state::ApiState;

pub async fn create_partition(
    State(state): State<ApiState>,
    Json(payload): Json<PartitionCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreatePartitionCommand {
        name: payload.name,
        description: payload.description,
        size_bytes: payload.size_bytes,
        record_count: payload.record_count,
    };

    let partition = state
        .partitions
        .create(command)
        .await
        .map_err(partition_to_api)?;

    Ok((StatusCode::CREATED, Json(partition)))
}

pub async fn list_partitions(
    State(state): State<ApiState>,
    Query(query): Query<SkipLimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let partitions = state
        .partitions
        .list(query.window())
        .await
        .map_err(partition_to_api)?;

    Ok(Json(partitions))
}

pub async fn read_partition(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let partition = state
        .partitions
        .find(id)
        .await
        .map_err(partition_to_api)?;

    Ok(Json(partition))
}

pub async fn update_partition(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PartitionUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdatePartitionCommand {
        name: payload.name,
        description: payload.description,
        size_bytes: payload.size_bytes,
        record_count: payload.record_count,
    };

    let partition = state
        .partitions
        .update(id, command)
        .await
        .map_err(partition_to_api)?;

    Ok(Json(partition))
}

pub async fn delete_partition(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .partitions
        .delete(id)
        .await
        .map_err(partition_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}
