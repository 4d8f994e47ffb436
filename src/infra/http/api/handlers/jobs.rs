//! Background queue handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::jobs::JobServiceError;

use super::job_to_api;
use crate::infra::http::api::error::{ApiError, codes};
use crate::infra::http::api::models::*;
use crate::infra::http::api::rate_limit::Throttle;
use crate::infra::http::api::state::ApiState;

pub async fn enqueue_job(
    State(state): State<ApiState>,
    _throttle: Throttle,
    Query(query): Query<EnqueueJobQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state
        .jobs
        .enqueue_sample(&query.task_message)
        .await
        .map_err(|err| match err {
            JobServiceError::Repo(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::JOBS,
                "Failed to enqueue task",
                Some(err.to_string()),
            ),
            other => job_to_api(other),
        })?;

    Ok((StatusCode::CREATED, Json(JobCreatedResponse { id })))
}

/// Current state of a job, or `null` when the id is unknown.
pub async fn read_job_status(
    State(state): State<ApiState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job = state.jobs.status(&job_id).await.map_err(job_to_api)?;
    Ok(Json(job))
}
