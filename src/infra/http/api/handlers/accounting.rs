//! Accounting ledger handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::ledger::{CreateLedgerEntryCommand, UpdateLedgerEntryCommand};
use crate::application::pagination::Window;
use crate::application::repos::LedgerQueryFilter;

use super::{LedgerListQuery, ledger_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::rate_limit::Throttle;
use crate::infra::http::api::state::ApiState;

pub async fn create_ledger_entry(
    State(state): State<ApiState>,
    _throttle: Throttle,
    Json(payload): Json<LedgerEntryCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateLedgerEntryCommand {
        description: payload.description,
        amount: payload.amount,
        transaction_type: payload.transaction_type,
        category: payload.category,
    };

    let entry = state.ledger.create(command).await.map_err(ledger_to_api)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_ledger_entries(
    State(state): State<ApiState>,
    Query(query): Query<LedgerListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = LedgerQueryFilter {
        transaction_type: query.transaction_type,
        category: query.category,
    };

    let entries = state
        .ledger
        .list(&filter, Window::new(query.skip, query.limit))
        .await
        .map_err(ledger_to_api)?;

    Ok(Json(entries))
}

pub async fn read_ledger_entry(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.ledger.find(id).await.map_err(ledger_to_api)?;
    Ok(Json(entry))
}

pub async fn update_ledger_entry(
    State(state): State<ApiState>,
    _throttle: Throttle,
    Path(id): Path<i64>,
    Json(payload): Json<LedgerEntryUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = UpdateLedgerEntryCommand {
        description: payload.description,
        amount: payload.amount,
        transaction_type: payload.transaction_type,
        category: payload.category,
    };

    let entry = state
        .ledger
        .update(id, command)
        .await
        .map_err(ledger_to_api)?;

    Ok(Json(entry))
}

pub async fn delete_ledger_entry(
    State(state): State<ApiState>,
    _throttle: Throttle,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    state.ledger.delete(id).await.map_err(ledger_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn ledger_summary(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let summary = state.ledger.summary().await.map_err(ledger_to_api)?;
    Ok(Json(summary))
}
