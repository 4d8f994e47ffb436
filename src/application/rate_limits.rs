use std::sync::Arc;

use thiserror::Error;

use crate::application::pagination::{PageRequest, PaginatedList};
use crate::application::repos::{
    CreateRateLimitParams, RateLimitsRepo, RepoError, TiersRepo, UpdateRateLimitParams,
};
use crate::domain::entities::{RateLimitRecord, TierRecord};
use crate::domain::error::DomainError;
use crate::domain::validation;
use crate::rate_limit::sanitize_path;

#[derive(Debug, Error)]
pub enum RateLimitServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Rate Limit Name not available")]
    Duplicate,
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateRateLimitCommand {
    pub name: String,
    pub path: String,
    pub limit: i32,
    pub period: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRateLimitCommand {
    pub name: Option<String>,
    pub path: Option<String>,
    pub limit: Option<i32>,
    pub period: Option<i32>,
}

#[derive(Clone)]
pub struct RateLimitService {
    tiers: Arc<dyn TiersRepo>,
    rate_limits: Arc<dyn RateLimitsRepo>,
}

impl RateLimitService {
    pub fn new(tiers: Arc<dyn TiersRepo>, rate_limits: Arc<dyn RateLimitsRepo>) -> Self {
        Self { tiers, rate_limits }
    }

    /// Paths are stored in the same sanitized form the limiter looks them up by.
    pub async fn create(
        &self,
        tier_name: &str,
        command: CreateRateLimitCommand,
    ) -> Result<RateLimitRecord, RateLimitServiceError> {
        let tier = self.tier(tier_name).await?;

        validation::non_empty("name", &command.name)?;
        validation::non_empty("path", &command.path)?;
        validation::positive_i32("limit", command.limit)?;
        validation::positive_i32("period", command.period)?;

        if self.rate_limits.rate_limit_name_exists(&command.name).await? {
            return Err(RateLimitServiceError::Duplicate);
        }

        self.rate_limits
            .create_rate_limit(CreateRateLimitParams {
                tier_id: tier.id,
                name: command.name,
                path: sanitize_path(&command.path),
                limit: command.limit,
                period: command.period,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => RateLimitServiceError::Duplicate,
                other => RateLimitServiceError::Repo(other),
            })
    }

    pub async fn list(
        &self,
        tier_name: &str,
        request: PageRequest,
    ) -> Result<PaginatedList<RateLimitRecord>, RateLimitServiceError> {
        let tier = self.tier(tier_name).await?;
        let (limits, total) = self
            .rate_limits
            .list_rate_limits(tier.id, request.window())
            .await?;
        Ok(PaginatedList::new(limits, total, request))
    }

    pub async fn get(
        &self,
        tier_name: &str,
        id: i64,
    ) -> Result<RateLimitRecord, RateLimitServiceError> {
        let tier = self.tier(tier_name).await?;
        self.rate_limits
            .find_rate_limit(tier.id, id)
            .await?
            .ok_or(RateLimitServiceError::NotFound("Rate Limit not found"))
    }

    pub async fn update(
        &self,
        tier_name: &str,
        id: i64,
        command: UpdateRateLimitCommand,
    ) -> Result<RateLimitRecord, RateLimitServiceError> {
        let current = self.get(tier_name, id).await?;

        if let Some(name) = command.name.as_deref() {
            validation::non_empty("name", name)?;
            if name != current.name && self.rate_limits.rate_limit_name_exists(name).await? {
                return Err(RateLimitServiceError::Duplicate);
            }
        }
        if let Some(path) = command.path.as_deref() {
            validation::non_empty("path", path)?;
        }
        if let Some(limit) = command.limit {
            validation::positive_i32("limit", limit)?;
        }
        if let Some(period) = command.period {
            validation::positive_i32("period", period)?;
        }

        self.rate_limits
            .update_rate_limit(
                current.id,
                UpdateRateLimitParams {
                    name: command.name,
                    path: command.path.as_deref().map(sanitize_path),
                    limit: command.limit,
                    period: command.period,
                },
            )
            .await
            .map_err(RateLimitServiceError::from)
    }

    pub async fn delete(&self, tier_name: &str, id: i64) -> Result<(), RateLimitServiceError> {
        let current = self.get(tier_name, id).await?;
        self.rate_limits
            .delete_rate_limit(current.id)
            .await
            .map_err(RateLimitServiceError::from)
    }

    async fn tier(&self, name: &str) -> Result<TierRecord, RateLimitServiceError> {
        self.tiers
            .find_tier_by_name(name)
            .await?
            .ok_or(RateLimitServiceError::NotFound("Tier not found"))
    }
}
