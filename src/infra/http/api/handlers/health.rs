use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::application::error::ErrorReport;
use crate::infra::http::api::models::HealthResponse;
use crate::infra::http::api::state::ApiState;

/// Service identity plus a database ping; 503 when the database is unreachable.
pub async fn health(State(state): State<ApiState>) -> Response {
    let ping = state.health.ping().await;
    let body = HealthResponse {
        name: state.app.name.clone(),
        version: state.app.version.clone(),
        description: state.app.description.clone(),
        database: if ping.is_ok() { "ok" } else { "unavailable" },
    };

    match ping {
        Ok(()) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            warn!(target = "coinpost::http::health", error = %err, "database ping failed");
            let mut response = (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
            ErrorReport::from_error(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
