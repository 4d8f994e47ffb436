//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::pagination::Window;
use crate::domain::entities::{
    CryptoCurrencyRecord, HoldingRecord, HoldingWithCrypto, JobRecord, LedgerEntryRecord,
    PartitionRecord, PostRecord, RateLimitRecord, TierRecord, TransferRecord, UserRecord,
};
use crate::domain::types::{JobType, LedgerEntryKind};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserParams {
    pub name: String,
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub profile_image_url: String,
    pub is_superuser: bool,
    pub tier_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserParams {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub created_by_user_id: i64,
    pub title: String,
    pub text: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePostParams {
    pub title: Option<String>,
    pub text: Option<String>,
    pub media_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateRateLimitParams {
    pub tier_id: i64,
    pub name: String,
    pub path: String,
    pub limit: i32,
    pub period: i32,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRateLimitParams {
    pub name: Option<String>,
    pub path: Option<String>,
    pub limit: Option<i32>,
    pub period: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct CreateCryptoParams {
    pub name: String,
    pub symbol: String,
    pub price_usd: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreateTransferParams {
    pub sender: String,
    pub receiver: String,
    pub amount: Decimal,
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateLedgerEntryParams {
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: LedgerEntryKind,
    pub category: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateLedgerEntryParams {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub transaction_type: Option<LedgerEntryKind>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LedgerQueryFilter {
    pub transaction_type: Option<LedgerEntryKind>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerTotals {
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone)]
pub struct CreatePartitionParams {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub size_bytes: i64,
    pub record_count: i64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePartitionParams {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size_bytes: Option<i64>,
    pub record_count: Option<i64>,
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError>;

    /// Deleted users are only returned when `include_deleted` is set.
    async fn find_user_by_username(
        &self,
        username: &str,
        include_deleted: bool,
    ) -> Result<Option<UserRecord>, RepoError>;

    /// Active user whose username or email equals `login`.
    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn email_exists(&self, email: &str) -> Result<bool, RepoError>;

    async fn username_exists(&self, username: &str) -> Result<bool, RepoError>;

    async fn list_active_users(&self, window: Window)
    -> Result<(Vec<UserRecord>, u64), RepoError>;

    async fn update_user(
        &self,
        id: i64,
        params: UpdateUserParams,
    ) -> Result<UserRecord, RepoError>;

    async fn set_user_tier(&self, id: i64, tier_id: i64) -> Result<UserRecord, RepoError>;

    async fn soft_delete_user(&self, id: i64) -> Result<(), RepoError>;

    async fn hard_delete_user(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TiersRepo: Send + Sync {
    async fn create_tier(&self, name: &str) -> Result<TierRecord, RepoError>;

    async fn find_tier_by_id(&self, id: i64) -> Result<Option<TierRecord>, RepoError>;

    async fn find_tier_by_name(&self, name: &str) -> Result<Option<TierRecord>, RepoError>;

    async fn list_tiers(&self, window: Window) -> Result<(Vec<TierRecord>, u64), RepoError>;

    async fn rename_tier(&self, id: i64, name: &str) -> Result<TierRecord, RepoError>;

    async fn delete_tier(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    /// Active post by id, optionally restricted to one author.
    async fn find_post(
        &self,
        id: i64,
        author_id: Option<i64>,
    ) -> Result<Option<PostRecord>, RepoError>;

    async fn list_posts_by_author(
        &self,
        author_id: i64,
        window: Window,
    ) -> Result<(Vec<PostRecord>, u64), RepoError>;

    async fn update_post(
        &self,
        id: i64,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError>;

    async fn soft_delete_post(&self, id: i64) -> Result<(), RepoError>;

    async fn hard_delete_post(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait RateLimitsRepo: Send + Sync {
    async fn create_rate_limit(
        &self,
        params: CreateRateLimitParams,
    ) -> Result<RateLimitRecord, RepoError>;

    async fn rate_limit_name_exists(&self, name: &str) -> Result<bool, RepoError>;

    async fn find_rate_limit(
        &self,
        tier_id: i64,
        id: i64,
    ) -> Result<Option<RateLimitRecord>, RepoError>;

    async fn find_rate_limit_for_path(
        &self,
        tier_id: i64,
        path: &str,
    ) -> Result<Option<RateLimitRecord>, RepoError>;

    async fn list_rate_limits(
        &self,
        tier_id: i64,
        window: Window,
    ) -> Result<(Vec<RateLimitRecord>, u64), RepoError>;

    /// Every rule of a tier, without paging.
    async fn list_rate_limits_for_tier(
        &self,
        tier_id: i64,
    ) -> Result<Vec<RateLimitRecord>, RepoError>;

    async fn update_rate_limit(
        &self,
        id: i64,
        params: UpdateRateLimitParams,
    ) -> Result<RateLimitRecord, RepoError>;

    async fn delete_rate_limit(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CryptoRepo: Send + Sync {
    async fn create_crypto(
        &self,
        params: CreateCryptoParams,
    ) -> Result<CryptoCurrencyRecord, RepoError>;

    async fn find_crypto_by_id(&self, id: i64) -> Result<Option<CryptoCurrencyRecord>, RepoError>;

    /// Match on symbol or name, used for duplicate detection.
    async fn find_crypto_conflict(
        &self,
        symbol: &str,
        name: &str,
    ) -> Result<Option<CryptoCurrencyRecord>, RepoError>;

    async fn find_crypto_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<CryptoCurrencyRecord>, RepoError>;

    async fn list_cryptos(&self) -> Result<Vec<CryptoCurrencyRecord>, RepoError>;

    async fn update_crypto_price(
        &self,
        id: i64,
        price_usd: Decimal,
    ) -> Result<CryptoCurrencyRecord, RepoError>;

    async fn create_holding(
        &self,
        user_id: i64,
        crypto_id: i64,
        amount: Decimal,
    ) -> Result<HoldingRecord, RepoError>;

    async fn list_holdings(&self, user_id: i64) -> Result<Vec<HoldingWithCrypto>, RepoError>;
}

#[async_trait]
pub trait TransfersRepo: Send + Sync {
    async fn create_transfer(
        &self,
        params: CreateTransferParams,
    ) -> Result<TransferRecord, RepoError>;

    async fn list_transfers(&self, window: Window) -> Result<Vec<TransferRecord>, RepoError>;

    async fn find_transfer(&self, id: i64) -> Result<Option<TransferRecord>, RepoError>;
}

#[async_trait]
pub trait LedgerRepo: Send + Sync {
    async fn create_entry(
        &self,
        params: CreateLedgerEntryParams,
    ) -> Result<LedgerEntryRecord, RepoError>;

    async fn list_entries(
        &self,
        filter: &LedgerQueryFilter,
        window: Window,
    ) -> Result<Vec<LedgerEntryRecord>, RepoError>;

    async fn find_entry(&self, id: i64) -> Result<Option<LedgerEntryRecord>, RepoError>;

    async fn update_entry(
        &self,
        id: i64,
        params: UpdateLedgerEntryParams,
    ) -> Result<LedgerEntryRecord, RepoError>;

    async fn delete_entry(&self, id: i64) -> Result<(), RepoError>;

    async fn totals(&self) -> Result<LedgerTotals, RepoError>;
}

#[async_trait]
pub trait PartitionsRepo: Send + Sync {
    async fn create_partition(
        &self,
        params: CreatePartitionParams,
    ) -> Result<PartitionRecord, RepoError>;

    async fn list_partitions(&self, window: Window) -> Result<Vec<PartitionRecord>, RepoError>;

    async fn find_partition(&self, id: Uuid) -> Result<Option<PartitionRecord>, RepoError>;

    async fn update_partition(
        &self,
        id: Uuid,
        params: UpdatePartitionParams,
    ) -> Result<PartitionRecord, RepoError>;

    async fn delete_partition(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait TokenBlacklistRepo: Send + Sync {
    async fn blacklist_token(
        &self,
        token_digest: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), RepoError>;

    async fn is_token_blacklisted(&self, token_digest: &str) -> Result<bool, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewJobRecord {
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub run_at: OffsetDateTime,
    pub max_attempts: i32,
    pub priority: i32,
}

/// Producer side of the background queue. Workers consume the same table
/// through their storage backend.
#[async_trait]
pub trait JobsRepo: Send + Sync {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError>;

    async fn find_job(&self, id: &str) -> Result<Option<JobRecord>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
