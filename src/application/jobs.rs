//! Background jobs: the producer used by the API and the worker functions run
//! by the queue monitor.

use std::sync::Arc;
use std::time::Duration;

use apalis::prelude::{Data, Error as ApalisError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::repos::{JobsRepo, NewJobRecord, RepoError};
use crate::domain::entities::JobRecord;
use crate::domain::error::DomainError;
use crate::domain::types::JobType;
use crate::domain::validation;

const SAMPLE_MAX_ATTEMPTS: i32 = 5;

#[derive(Debug, Error)]
pub enum JobServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("payload could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleJobPayload {
    pub message: String,
}

#[derive(Clone)]
pub struct JobService {
    repo: Arc<dyn JobsRepo>,
}

impl JobService {
    pub fn new(repo: Arc<dyn JobsRepo>) -> Self {
        Self { repo }
    }

    /// Queue the sample task and return the job id.
    pub async fn enqueue_sample(&self, message: &str) -> Result<String, JobServiceError> {
        validation::non_empty("task_message", message)?;
        let payload = serde_json::to_value(SampleJobPayload {
            message: message.to_string(),
        })?;

        let id = self
            .repo
            .enqueue_job(NewJobRecord {
                job_type: JobType::SampleTask,
                payload,
                run_at: OffsetDateTime::now_utc(),
                max_attempts: SAMPLE_MAX_ATTEMPTS,
                priority: 0,
            })
            .await?;

        info!(target = "coinpost::jobs", job_id = %id, "sample task enqueued");
        Ok(id)
    }

    pub async fn status(&self, id: &str) -> Result<Option<JobRecord>, JobServiceError> {
        Ok(self.repo.find_job(id).await?)
    }
}

/// Shared state handed to queue workers.
#[derive(Clone, Debug)]
pub struct JobWorkerContext {
    pub sample_task_delay: Duration,
}

pub async fn process_sample_job(
    payload: SampleJobPayload,
    context: Data<JobWorkerContext>,
) -> Result<(), ApalisError> {
    tokio::time::sleep(context.sample_task_delay).await;
    info!(
        target = "coinpost::jobs",
        message = %payload.message,
        "sample task complete"
    );
    Ok(())
}
