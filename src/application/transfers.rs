use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;
use time::OffsetDateTime;

use crate::application::pagination::Window;
use crate::application::repos::{CreateTransferParams, RepoError, TransfersRepo};
use crate::domain::entities::TransferRecord;
use crate::domain::error::DomainError;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum TransferServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Transaction not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateTransferCommand {
    pub sender: String,
    pub receiver: String,
    pub amount: Decimal,
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Clone)]
pub struct TransferService {
    repo: Arc<dyn TransfersRepo>,
}

impl TransferService {
    pub fn new(repo: Arc<dyn TransfersRepo>) -> Self {
        Self { repo }
    }

    pub async fn record(
        &self,
        command: CreateTransferCommand,
    ) -> Result<TransferRecord, TransferServiceError> {
        validation::non_empty("sender", &command.sender)?;
        validation::non_empty("receiver", &command.receiver)?;
        validation::positive_amount("amount", command.amount)?;

        self.repo
            .create_transfer(CreateTransferParams {
                sender: command.sender,
                receiver: command.receiver,
                amount: command.amount,
                timestamp: command.timestamp.unwrap_or_else(OffsetDateTime::now_utc),
            })
            .await
            .map_err(TransferServiceError::from)
    }

    pub async fn list(&self, window: Window) -> Result<Vec<TransferRecord>, TransferServiceError> {
        self.repo
            .list_transfers(window)
            .await
            .map_err(TransferServiceError::from)
    }

    pub async fn detail(&self, id: i64) -> Result<TransferRecord, TransferServiceError> {
        self.repo
            .find_transfer(id)
            .await?
            .ok_or(TransferServiceError::NotFound)
    }
}
