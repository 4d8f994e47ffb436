//! Cryptocurrency and holding handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::crypto::CreateCryptoCommand;

use super::crypto_to_api;
use crate::infra::http::api::auth::{CurrentUser, Superuser};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::*;
use crate::infra::http::api::rate_limit::Throttle;
use crate::infra::http::api::state::ApiState;

pub async fn create_crypto(
    State(state): State<ApiState>,
    _throttle: Throttle,
    Json(payload): Json<CryptoCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let command = CreateCryptoCommand {
        name: payload.name,
        symbol: payload.symbol,
        price_usd: payload.price_usd,
    };

    let crypto = state.crypto.create(command).await.map_err(crypto_to_api)?;

    Ok((StatusCode::CREATED, Json(crypto)))
}

pub async fn list_cryptos(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let cryptos = state.crypto.list().await.map_err(crypto_to_api)?;
    Ok(Json(cryptos))
}

pub async fn read_crypto(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let crypto = state.crypto.find(&symbol).await.map_err(crypto_to_api)?;
    Ok(Json(crypto))
}

pub async fn update_crypto_price(
    State(state): State<ApiState>,
    _admin: Superuser,
    _throttle: Throttle,
    Path(symbol): Path<String>,
    Json(payload): Json<CryptoPriceUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let crypto = state
        .crypto
        .update_price(&symbol, payload.price_usd)
        .await
        .map_err(crypto_to_api)?;

    Ok(Json(crypto))
}

pub async fn create_holding(
    State(state): State<ApiState>,
    current: CurrentUser,
    _throttle: Throttle,
    Json(payload): Json<HoldingCreateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let holding = state
        .crypto
        .add_holding(&current.user, payload.crypto_id, payload.amount)
        .await
        .map_err(crypto_to_api)?;

    Ok((StatusCode::CREATED, Json(holding)))
}

pub async fn list_holdings(
    State(state): State<ApiState>,
    current: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let holdings = state
        .crypto
        .holdings(&current.user)
        .await
        .map_err(crypto_to_api)?;

    Ok(Json(holdings))
}
