//! Income and expense bookkeeping.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::application::pagination::Window;
use crate::application::repos::{
    CreateLedgerEntryParams, LedgerQueryFilter, LedgerRepo, RepoError, UpdateLedgerEntryParams,
};
use crate::domain::entities::LedgerEntryRecord;
use crate::domain::error::DomainError;
use crate::domain::types::LedgerEntryKind;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum LedgerServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Transaction not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateLedgerEntryCommand {
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: LedgerEntryKind,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLedgerEntryCommand {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub transaction_type: Option<LedgerEntryKind>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub income: Decimal,
    pub expense: Decimal,
    pub balance: Decimal,
}

#[derive(Clone)]
pub struct LedgerService {
    repo: Arc<dyn LedgerRepo>,
}

impl LedgerService {
    pub fn new(repo: Arc<dyn LedgerRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        command: CreateLedgerEntryCommand,
    ) -> Result<LedgerEntryRecord, LedgerServiceError> {
        validate_description(&command.description)?;
        validate_category(&command.category)?;
        validation::positive_amount("amount", command.amount)?;

        self.repo
            .create_entry(CreateLedgerEntryParams {
                description: command.description,
                amount: command.amount,
                transaction_type: command.transaction_type,
                category: command.category,
            })
            .await
            .map_err(LedgerServiceError::from)
    }

    pub async fn list(
        &self,
        filter: &LedgerQueryFilter,
        window: Window,
    ) -> Result<Vec<LedgerEntryRecord>, LedgerServiceError> {
        self.repo
            .list_entries(filter, window)
            .await
            .map_err(LedgerServiceError::from)
    }

    pub async fn find(&self, id: i64) -> Result<LedgerEntryRecord, LedgerServiceError> {
        self.repo
            .find_entry(id)
            .await?
            .ok_or(LedgerServiceError::NotFound)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateLedgerEntryCommand,
    ) -> Result<LedgerEntryRecord, LedgerServiceError> {
        if let Some(description) = command.description.as_deref() {
            validate_description(description)?;
        }
        if let Some(category) = command.category.as_deref() {
            validate_category(category)?;
        }
        if let Some(amount) = command.amount {
            validation::positive_amount("amount", amount)?;
        }

        let entry = self.find(id).await?;
        self.repo
            .update_entry(
                entry.id,
                UpdateLedgerEntryParams {
                    description: command.description,
                    amount: command.amount,
                    transaction_type: command.transaction_type,
                    category: command.category,
                },
            )
            .await
            .map_err(LedgerServiceError::from)
    }

    pub async fn delete(&self, id: i64) -> Result<(), LedgerServiceError> {
        let entry = self.find(id).await?;
        self.repo
            .delete_entry(entry.id)
            .await
            .map_err(LedgerServiceError::from)
    }

    pub async fn summary(&self) -> Result<LedgerSummary, LedgerServiceError> {
        let totals = self.repo.totals().await?;
        Ok(LedgerSummary {
            income: totals.income,
            expense: totals.expense,
            balance: totals.income - totals.expense,
        })
    }
}

fn validate_description(value: &str) -> Result<(), DomainError> {
    validation::non_empty("description", value)?;
    validation::max_chars("description", value, validation::LEDGER_DESCRIPTION_MAX)
}

fn validate_category(value: &str) -> Result<(), DomainError> {
    validation::non_empty("category", value)?;
    validation::max_chars("category", value, validation::LEDGER_CATEGORY_MAX)
}
