use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{PageRequest, PaginatedList};
use crate::application::repos::{RepoError, TiersRepo};
use crate::domain::entities::TierRecord;
use crate::domain::error::DomainError;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum TierServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Tier Name not available")]
    Duplicate,
    #[error("Tier not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct TierService {
    tiers: Arc<dyn TiersRepo>,
}

impl TierService {
    pub fn new(tiers: Arc<dyn TiersRepo>) -> Self {
        Self { tiers }
    }

    pub async fn create(&self, name: &str) -> Result<TierRecord, TierServiceError> {
        validation::non_empty("name", name)?;
        if self.tiers.find_tier_by_name(name).await?.is_some() {
            return Err(TierServiceError::Duplicate);
        }
        self.tiers.create_tier(name).await.map_err(|err| match err {
            RepoError::Duplicate { .. } => TierServiceError::Duplicate,
            other => TierServiceError::Repo(other),
        })
    }

    pub async fn list(
        &self,
        request: PageRequest,
    ) -> Result<PaginatedList<TierRecord>, TierServiceError> {
        let (tiers, total) = self.tiers.list_tiers(request.window()).await?;
        Ok(PaginatedList::new(tiers, total, request))
    }

    pub async fn find(&self, name: &str) -> Result<TierRecord, TierServiceError> {
        self.tiers
            .find_tier_by_name(name)
            .await?
            .ok_or(TierServiceError::NotFound)
    }

    pub async fn rename(&self, name: &str, new_name: &str) -> Result<TierRecord, TierServiceError> {
        validation::non_empty("name", new_name)?;
        let tier = self.find(name).await?;
        if new_name != tier.name && self.tiers.find_tier_by_name(new_name).await?.is_some() {
            return Err(TierServiceError::Duplicate);
        }
        self.tiers
            .rename_tier(tier.id, new_name)
            .await
            .map_err(TierServiceError::from)
    }

    pub async fn delete(&self, name: &str) -> Result<(), TierServiceError> {
        let tier = self.find(name).await?;
        self.tiers
            .delete_tier(tier.id)
            .await
            .map_err(TierServiceError::from)
    }
}
