use std::sync::Arc;
use std::time::Duration;

use crate::application::auth::{AuthService, TokenPolicy};
use crate::application::crypto::CryptoService;
use crate::application::jobs::JobService;
use crate::application::ledger::LedgerService;
use crate::application::partitions::PartitionService;
use crate::application::posts::PostService;
use crate::application::rate_limits::RateLimitService;
use crate::application::repos::{
    CryptoRepo, HealthRepo, JobsRepo, LedgerRepo, PartitionsRepo, PostsRepo, RateLimitsRepo,
    TiersRepo, TokenBlacklistRepo, TransfersRepo, UsersRepo,
};
use crate::application::tiers::TierService;
use crate::application::transfers::TransferService;
use crate::application::users::UserService;
use crate::cache::{ClientCacheState, ResponseCache};
use crate::config::{AppSettings, Settings};
use crate::infra::backends::RedisBackends;
use crate::rate_limit::{Quota, RateLimiter};

#[derive(Clone)]
pub struct ApiState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub tiers: Arc<TierService>,
    pub posts: Arc<PostService>,
    pub rate_limits: Arc<RateLimitService>,
    pub crypto: Arc<CryptoService>,
    pub transfers: Arc<TransferService>,
    pub ledger: Arc<LedgerService>,
    pub partitions: Arc<PartitionService>,
    pub jobs: Arc<JobService>,
    pub cache: Arc<ResponseCache>,
    pub client_cache: ClientCacheState,
    pub rate_limiter: Arc<RateLimiter>,
    /// Tier rules consulted by the limiter on every throttled request.
    pub rate_limit_rules: Arc<dyn RateLimitsRepo>,
    pub default_quota: Quota,
    pub health: Arc<dyn HealthRepo>,
    pub app: AppSettings,
}

impl ApiState {
    /// Wire every service against one repository implementation.
    pub fn build<R>(repositories: Arc<R>, backends: RedisBackends, settings: &Settings) -> Self
    where
        R: UsersRepo
            + TiersRepo
            + PostsRepo
            + RateLimitsRepo
            + CryptoRepo
            + TransfersRepo
            + LedgerRepo
            + PartitionsRepo
            + TokenBlacklistRepo
            + JobsRepo
            + HealthRepo
            + 'static,
    {
        let users_repo: Arc<dyn UsersRepo> = repositories.clone();
        let tiers_repo: Arc<dyn TiersRepo> = repositories.clone();
        let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
        let rate_limits_repo: Arc<dyn RateLimitsRepo> = repositories.clone();
        let crypto_repo: Arc<dyn CryptoRepo> = repositories.clone();
        let transfers_repo: Arc<dyn TransfersRepo> = repositories.clone();
        let ledger_repo: Arc<dyn LedgerRepo> = repositories.clone();
        let partitions_repo: Arc<dyn PartitionsRepo> = repositories.clone();
        let blacklist_repo: Arc<dyn TokenBlacklistRepo> = repositories.clone();
        let jobs_repo: Arc<dyn JobsRepo> = repositories.clone();
        let health_repo: Arc<dyn HealthRepo> = repositories;

        let auth = Arc::new(AuthService::new(
            users_repo.clone(),
            blacklist_repo,
            TokenPolicy::from(&settings.auth),
        ));
        let users = Arc::new(UserService::new(
            users_repo.clone(),
            tiers_repo.clone(),
            rate_limits_repo.clone(),
            auth.clone(),
        ));

        let default_quota = Quota::new(
            settings.rate_limit.default_limit.get(),
            settings.rate_limit.default_period,
        );

        Self {
            auth,
            users,
            tiers: Arc::new(TierService::new(tiers_repo.clone())),
            posts: Arc::new(PostService::new(users_repo, posts_repo)),
            rate_limits: Arc::new(RateLimitService::new(tiers_repo, rate_limits_repo.clone())),
            crypto: Arc::new(CryptoService::new(crypto_repo)),
            transfers: Arc::new(TransferService::new(transfers_repo)),
            ledger: Arc::new(LedgerService::new(ledger_repo)),
            partitions: Arc::new(PartitionService::new(partitions_repo)),
            jobs: Arc::new(JobService::new(jobs_repo)),
            cache: Arc::new(ResponseCache::new(backends.cache, settings.cache.enabled)),
            client_cache: ClientCacheState {
                max_age_seconds: settings.cache.client_max_age_seconds,
            },
            rate_limiter: Arc::new(RateLimiter::new(backends.rate_limit)),
            rate_limit_rules: rate_limits_repo,
            default_quota,
            health: health_repo,
            app: settings.app.clone(),
        }
    }

    /// Quota for a tier rule, `None` when the stored values are unusable.
    pub fn rule_quota(limit: i32, period: i32) -> Option<Quota> {
        let limit = u32::try_from(limit).ok().filter(|limit| *limit > 0)?;
        let period = u64::try_from(period).ok().filter(|period| *period > 0)?;
        Some(Quota::new(limit, Duration::from_secs(period)))
    }
}
