//! Finance transfer handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::pagination::Window;
use crate::application::transfers::CreateTransferCommand;

use super::{StartCountQuery, transfer_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::rate_limit::Throttle;
use crate::infra::http::api::state::ApiState;

pub async fn create_transfer(
    State(state): State<ApiState>,
    _throttle: Throttle,
    Json(payload): Json<TransferCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateTransferCommand {
        sender: payload.sender,
        receiver: payload.receiver,
        amount: payload.amount,
        timestamp: payload.timestamp,
    };

    let transfer = state
        .transfers
        .record(command)
        .await
        .map_err(transfer_to_api)?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

pub async fn list_transfers(
    State(state): State<ApiState>,
    Query(query): Query<StartCountQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transfers = state
        .transfers
        .list(Window::new(query.start, query.count))
        .await
        .map_err(transfer_to_api)?;

    Ok(Json(transfers))
}

pub async fn read_transfer(
    State(state): State<ApiState>,
    Path(tx_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = state
        .transfers
        .detail(tx_id)
        .await
        .map_err(transfer_to_api)?;

    Ok(Json(transfer))
}
