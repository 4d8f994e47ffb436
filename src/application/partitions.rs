use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::Window;
use crate::application::repos::{
    CreatePartitionParams, PartitionsRepo, RepoError, UpdatePartitionParams,
};
use crate::domain::entities::PartitionRecord;
use crate::domain::error::DomainError;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum PartitionServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Partition name already exists")]
    Duplicate,
    #[error("Partition not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, Default)]
pub struct CreatePartitionCommand {
    pub name: String,
    pub description: Option<String>,
    pub size_bytes: Option<i64>,
    pub record_count: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePartitionCommand {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size_bytes: Option<i64>,
    pub record_count: Option<i64>,
}

#[derive(Clone)]
pub struct PartitionService {
    repo: Arc<dyn PartitionsRepo>,
}

impl PartitionService {
    pub fn new(repo: Arc<dyn PartitionsRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        command: CreatePartitionCommand,
    ) -> Result<PartitionRecord, PartitionServiceError> {
        validate_name(&command.name)?;
        if let Some(description) = command.description.as_deref() {
            validate_description(description)?;
        }
        let size_bytes = command.size_bytes.unwrap_or(0);
        let record_count = command.record_count.unwrap_or(0);
        validation::non_negative_i64("size_bytes", size_bytes)?;
        validation::non_negative_i64("record_count", record_count)?;

        self.repo
            .create_partition(CreatePartitionParams {
                id: Uuid::new_v4(),
                name: command.name,
                description: command.description,
                size_bytes,
                record_count,
            })
            .await
            .map_err(map_duplicate)
    }

    pub async fn list(&self, window: Window) -> Result<Vec<PartitionRecord>, PartitionServiceError> {
        self.repo
            .list_partitions(window)
            .await
            .map_err(PartitionServiceError::from)
    }

    pub async fn find(&self, id: Uuid) -> Result<PartitionRecord, PartitionServiceError> {
        self.repo
            .find_partition(id)
            .await?
            .ok_or(PartitionServiceError::NotFound)
    }

    pub async fn update(
        &self,
        id: Uuid,
        command: UpdatePartitionCommand,
    ) -> Result<PartitionRecord, PartitionServiceError> {
        if let Some(name) = command.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(description) = command.description.as_deref() {
            validate_description(description)?;
        }
        if let Some(size) = command.size_bytes {
            validation::non_negative_i64("size_bytes", size)?;
        }
        if let Some(count) = command.record_count {
            validation::non_negative_i64("record_count", count)?;
        }

        let partition = self.find(id).await?;
        self.repo
            .update_partition(
                partition.id,
                UpdatePartitionParams {
                    name: command.name,
                    description: command.description,
                    size_bytes: command.size_bytes,
                    record_count: command.record_count,
                },
            )
            .await
            .map_err(map_duplicate)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), PartitionServiceError> {
        let partition = self.find(id).await?;
        self.repo
            .delete_partition(partition.id)
            .await
            .map_err(PartitionServiceError::from)
    }
}

fn map_duplicate(err: RepoError) -> PartitionServiceError {
    match err {
        RepoError::Duplicate { .. } => PartitionServiceError::Duplicate,
        other => PartitionServiceError::Repo(other),
    }
}

fn validate_name(value: &str) -> Result<(), DomainError> {
    validation::non_empty("name", value)?;
    validation::max_chars("name", value, validation::PARTITION_NAME_MAX)
}

fn validate_description(value: &str) -> Result<(), DomainError> {
    validation::max_chars("description", value, validation::PARTITION_DESCRIPTION_MAX)
}
