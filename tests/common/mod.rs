//! In-memory repositories and request helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tower::ServiceExt;
use tracing::level_filters::LevelFilter;
use uuid::Uuid;

use coinpost::application::pagination::Window;
use coinpost::application::repos::{
    CreateCryptoParams, CreateLedgerEntryParams, CreatePartitionParams, CreatePostParams,
    CreateRateLimitParams, CreateTransferParams, CreateUserParams, CryptoRepo, HealthRepo,
    JobsRepo, LedgerQueryFilter, NewJobRecord, LedgerRepo, LedgerTotals, PartitionsRepo, PostsRepo, RateLimitsRepo,
    RepoError, TiersRepo, TokenBlacklistRepo, TransfersRepo, UpdateLedgerEntryParams,
    UpdatePartitionParams, UpdatePostParams, UpdateRateLimitParams, UpdateUserParams, UsersRepo,
};
use coinpost::cache::{CacheConfig, CacheStore, MemoryCacheStore};
use coinpost::config::{
    AppSettings, AuthSettings, DatabaseSettings, JobsSettings, LogFormat, LoggingSettings,
    RateLimitSettings, RedisSettings, ServerSettings, Settings, StoreBackend,
};
use coinpost::domain::entities::{
    CryptoCurrencyRecord, HoldingRecord, HoldingWithCrypto, JobRecord, LedgerEntryRecord,
    PartitionRecord, PostRecord, RateLimitRecord, TierRecord, TransferRecord, UserRecord,
};
use coinpost::domain::types::{JobState, LedgerEntryKind};
use coinpost::infra::backends::RedisBackends;
use coinpost::infra::http::{ApiState, build_router};
use coinpost::rate_limit::{MemoryRateLimitCounter, RateLimitCounter};

pub const PASSWORD: &str = "correct-horse";

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<UserRecord>,
    tiers: Vec<TierRecord>,
    posts: Vec<PostRecord>,
    rate_limits: Vec<RateLimitRecord>,
    cryptos: Vec<CryptoCurrencyRecord>,
    holdings: Vec<HoldingRecord>,
    transfers: Vec<TransferRecord>,
    ledger: Vec<LedgerEntryRecord>,
    partitions: Vec<PartitionRecord>,
    jobs: Vec<JobRecord>,
    blacklist: HashMap<String, OffsetDateTime>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

fn window_of<T: Clone>(items: &[T], window: Window) -> Vec<T> {
    items
        .iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .cloned()
        .collect()
}

fn duplicate(constraint: &str) -> RepoError {
    RepoError::Duplicate {
        constraint: constraint.to_string(),
    }
}

#[derive(Default)]
pub struct MemoryRepositories {
    tables: Mutex<Tables>,
    database_down: AtomicBool,
}

impl MemoryRepositories {
    pub fn set_database_down(&self, down: bool) {
        self.database_down.store(down, Ordering::SeqCst);
    }

    pub async fn post_count(&self) -> usize {
        self.tables.lock().await.posts.len()
    }
}

#[async_trait]
impl UsersRepo for MemoryRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.username == params.username) {
            return Err(duplicate("users_username_key"));
        }
        if tables.users.iter().any(|u| u.email == params.email) {
            return Err(duplicate("users_email_key"));
        }
        let user = UserRecord {
            id: tables.next_id(),
            uuid: Uuid::new_v4(),
            name: params.name,
            username: params.username,
            email: params.email,
            hashed_password: params.hashed_password,
            profile_image_url: params.profile_image_url,
            is_superuser: params.is_superuser,
            tier_id: params.tier_id,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            deleted_at: None,
            is_deleted: false,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
        include_deleted: bool,
    ) -> Result<Option<UserRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username && (include_deleted || !u.is_deleted))
            .cloned())
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .iter()
            .find(|u| !u.is_deleted && (u.username == login || u.email == login))
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().any(|u| u.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().any(|u| u.username == username))
    }

    async fn list_active_users(
        &self,
        window: Window,
    ) -> Result<(Vec<UserRecord>, u64), RepoError> {
        let tables = self.tables.lock().await;
        let active: Vec<UserRecord> = tables
            .users
            .iter()
            .filter(|u| !u.is_deleted)
            .cloned()
            .collect();
        Ok((window_of(&active, window), active.len() as u64))
    }

    async fn update_user(
        &self,
        id: i64,
        params: UpdateUserParams,
    ) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(name) = params.name {
            user.name = name;
        }
        if let Some(username) = params.username {
            user.username = username;
        }
        if let Some(email) = params.email {
            user.email = email;
        }
        if let Some(url) = params.profile_image_url {
            user.profile_image_url = url;
        }
        user.updated_at = Some(OffsetDateTime::now_utc());
        Ok(user.clone())
    }

    async fn set_user_tier(&self, id: i64, tier_id: i64) -> Result<UserRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        user.tier_id = Some(tier_id);
        Ok(user.clone())
    }

    async fn soft_delete_user(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepoError::NotFound)?;
        user.is_deleted = true;
        user.deleted_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn hard_delete_user(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.posts.retain(|p| p.created_by_user_id != id);
        tables.holdings.retain(|h| h.user_id != id);
        Ok(())
    }
}

#[async_trait]
impl TiersRepo for MemoryRepositories {
    async fn create_tier(&self, name: &str) -> Result<TierRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.tiers.iter().any(|t| t.name == name) {
            return Err(duplicate("tiers_name_key"));
        }
        let tier = TierRecord {
            id: tables.next_id(),
            name: name.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        tables.tiers.push(tier.clone());
        Ok(tier)
    }

    async fn find_tier_by_id(&self, id: i64) -> Result<Option<TierRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.tiers.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tier_by_name(&self, name: &str) -> Result<Option<TierRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.tiers.iter().find(|t| t.name == name).cloned())
    }

    async fn list_tiers(&self, window: Window) -> Result<(Vec<TierRecord>, u64), RepoError> {
        let tables = self.tables.lock().await;
        Ok((window_of(&tables.tiers, window), tables.tiers.len() as u64))
    }

    async fn rename_tier(&self, id: i64, name: &str) -> Result<TierRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let tier = tables
            .tiers
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(RepoError::NotFound)?;
        tier.name = name.to_string();
        Ok(tier.clone())
    }

    async fn delete_tier(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        tables.tiers.retain(|t| t.id != id);
        tables.rate_limits.retain(|r| r.tier_id != id);
        for user in tables.users.iter_mut().filter(|u| u.tier_id == Some(id)) {
            user.tier_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl PostsRepo for MemoryRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let post = PostRecord {
            id: tables.next_id(),
            uuid: Uuid::new_v4(),
            created_by_user_id: params.created_by_user_id,
            title: params.title,
            text: params.text,
            media_url: params.media_url,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
            deleted_at: None,
            is_deleted: false,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn find_post(
        &self,
        id: i64,
        author_id: Option<i64>,
    ) -> Result<Option<PostRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .iter()
            .find(|p| {
                p.id == id
                    && !p.is_deleted
                    && author_id.is_none_or(|author| p.created_by_user_id == author)
            })
            .cloned())
    }

    async fn list_posts_by_author(
        &self,
        author_id: i64,
        window: Window,
    ) -> Result<(Vec<PostRecord>, u64), RepoError> {
        let tables = self.tables.lock().await;
        let posts: Vec<PostRecord> = tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.created_by_user_id == author_id && !p.is_deleted)
            .cloned()
            .collect();
        Ok((window_of(&posts, window), posts.len() as u64))
    }

    async fn update_post(
        &self,
        id: i64,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(title) = params.title {
            post.title = title;
        }
        if let Some(text) = params.text {
            post.text = text;
        }
        if params.media_url.is_some() {
            post.media_url = params.media_url;
        }
        post.updated_at = Some(OffsetDateTime::now_utc());
        Ok(post.clone())
    }

    async fn soft_delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        post.is_deleted = true;
        post.deleted_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn hard_delete_post(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl RateLimitsRepo for MemoryRepositories {
    async fn create_rate_limit(
        &self,
        params: CreateRateLimitParams,
    ) -> Result<RateLimitRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.rate_limits.iter().any(|r| r.name == params.name) {
            return Err(duplicate("rate_limits_name_key"));
        }
        let rule = RateLimitRecord {
            id: tables.next_id(),
            tier_id: params.tier_id,
            name: params.name,
            path: params.path,
            limit: params.limit,
            period: params.period,
            created_at: OffsetDateTime::now_utc(),
            updated_at: None,
        };
        tables.rate_limits.push(rule.clone());
        Ok(rule)
    }

    async fn rate_limit_name_exists(&self, name: &str) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.rate_limits.iter().any(|r| r.name == name))
    }

    async fn find_rate_limit(
        &self,
        tier_id: i64,
        id: i64,
    ) -> Result<Option<RateLimitRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rate_limits
            .iter()
            .find(|r| r.tier_id == tier_id && r.id == id)
            .cloned())
    }

    async fn find_rate_limit_for_path(
        &self,
        tier_id: i64,
        path: &str,
    ) -> Result<Option<RateLimitRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rate_limits
            .iter()
            .find(|r| r.tier_id == tier_id && r.path == path)
            .cloned())
    }

    async fn list_rate_limits(
        &self,
        tier_id: i64,
        window: Window,
    ) -> Result<(Vec<RateLimitRecord>, u64), RepoError> {
        let tables = self.tables.lock().await;
        let rules: Vec<RateLimitRecord> = tables
            .rate_limits
            .iter()
            .filter(|r| r.tier_id == tier_id)
            .cloned()
            .collect();
        Ok((window_of(&rules, window), rules.len() as u64))
    }

    async fn list_rate_limits_for_tier(
        &self,
        tier_id: i64,
    ) -> Result<Vec<RateLimitRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .rate_limits
            .iter()
            .filter(|r| r.tier_id == tier_id)
            .cloned()
            .collect())
    }

    async fn update_rate_limit(
        &self,
        id: i64,
        params: UpdateRateLimitParams,
    ) -> Result<RateLimitRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let rule = tables
            .rate_limits
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(name) = params.name {
            rule.name = name;
        }
        if let Some(path) = params.path {
            rule.path = path;
        }
        if let Some(limit) = params.limit {
            rule.limit = limit;
        }
        if let Some(period) = params.period {
            rule.period = period;
        }
        rule.updated_at = Some(OffsetDateTime::now_utc());
        Ok(rule.clone())
    }

    async fn delete_rate_limit(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        tables.rate_limits.retain(|r| r.id != id);
        Ok(())
    }
}

#[async_trait]
impl CryptoRepo for MemoryRepositories {
    async fn create_crypto(
        &self,
        params: CreateCryptoParams,
    ) -> Result<CryptoCurrencyRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let crypto = CryptoCurrencyRecord {
            id: tables.next_id(),
            name: params.name,
            symbol: params.symbol,
            price_usd: params.price_usd,
        };
        tables.cryptos.push(crypto.clone());
        Ok(crypto)
    }

    async fn find_crypto_by_id(&self, id: i64) -> Result<Option<CryptoCurrencyRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.cryptos.iter().find(|c| c.id == id).cloned())
    }

    async fn find_crypto_conflict(
        &self,
        symbol: &str,
        name: &str,
    ) -> Result<Option<CryptoCurrencyRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .cryptos
            .iter()
            .find(|c| c.symbol == symbol || c.name == name)
            .cloned())
    }

    async fn find_crypto_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<CryptoCurrencyRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.cryptos.iter().find(|c| c.symbol == symbol).cloned())
    }

    async fn list_cryptos(&self) -> Result<Vec<CryptoCurrencyRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let mut cryptos = tables.cryptos.clone();
        cryptos.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(cryptos)
    }

    async fn update_crypto_price(
        &self,
        id: i64,
        price_usd: Decimal,
    ) -> Result<CryptoCurrencyRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let crypto = tables
            .cryptos
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepoError::NotFound)?;
        crypto.price_usd = price_usd;
        Ok(crypto.clone())
    }

    async fn create_holding(
        &self,
        user_id: i64,
        crypto_id: i64,
        amount: Decimal,
    ) -> Result<HoldingRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let holding = HoldingRecord {
            id: tables.next_id(),
            user_id,
            crypto_id,
            amount,
        };
        tables.holdings.push(holding.clone());
        Ok(holding)
    }

    async fn list_holdings(&self, user_id: i64) -> Result<Vec<HoldingWithCrypto>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .holdings
            .iter()
            .filter(|h| h.user_id == user_id)
            .filter_map(|h| {
                let crypto = tables.cryptos.iter().find(|c| c.id == h.crypto_id)?;
                Some(HoldingWithCrypto {
                    id: h.id,
                    user_id: h.user_id,
                    crypto_id: h.crypto_id,
                    amount: h.amount,
                    crypto: crypto.clone(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl TransfersRepo for MemoryRepositories {
    async fn create_transfer(
        &self,
        params: CreateTransferParams,
    ) -> Result<TransferRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let transfer = TransferRecord {
            transaction_id: tables.next_id(),
            sender: params.sender,
            receiver: params.receiver,
            amount: params.amount,
            timestamp: params.timestamp,
        };
        tables.transfers.push(transfer.clone());
        Ok(transfer)
    }

    async fn list_transfers(&self, window: Window) -> Result<Vec<TransferRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(window_of(&tables.transfers, window))
    }

    async fn find_transfer(&self, id: i64) -> Result<Option<TransferRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .transfers
            .iter()
            .find(|t| t.transaction_id == id)
            .cloned())
    }
}

#[async_trait]
impl LedgerRepo for MemoryRepositories {
    async fn create_entry(
        &self,
        params: CreateLedgerEntryParams,
    ) -> Result<LedgerEntryRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let now = OffsetDateTime::now_utc();
        let entry = LedgerEntryRecord {
            id: tables.next_id(),
            description: params.description,
            amount: params.amount,
            transaction_type: params.transaction_type,
            category: params.category,
            created_at: now,
            updated_at: now,
        };
        tables.ledger.push(entry.clone());
        Ok(entry)
    }

    async fn list_entries(
        &self,
        filter: &LedgerQueryFilter,
        window: Window,
    ) -> Result<Vec<LedgerEntryRecord>, RepoError> {
        let tables = self.tables.lock().await;
        let entries: Vec<LedgerEntryRecord> = tables
            .ledger
            .iter()
            .rev()
            .filter(|e| {
                filter
                    .transaction_type
                    .is_none_or(|kind| e.transaction_type == kind)
                    && filter
                        .category
                        .as_deref()
                        .is_none_or(|category| e.category == category)
            })
            .cloned()
            .collect();
        Ok(window_of(&entries, window))
    }

    async fn find_entry(&self, id: i64) -> Result<Option<LedgerEntryRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.ledger.iter().find(|e| e.id == id).cloned())
    }

    async fn update_entry(
        &self,
        id: i64,
        params: UpdateLedgerEntryParams,
    ) -> Result<LedgerEntryRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        let entry = tables
            .ledger
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(description) = params.description {
            entry.description = description;
        }
        if let Some(amount) = params.amount {
            entry.amount = amount;
        }
        if let Some(kind) = params.transaction_type {
            entry.transaction_type = kind;
        }
        if let Some(category) = params.category {
            entry.category = category;
        }
        entry.updated_at = OffsetDateTime::now_utc();
        Ok(entry.clone())
    }

    async fn delete_entry(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        tables.ledger.retain(|e| e.id != id);
        Ok(())
    }

    async fn totals(&self) -> Result<LedgerTotals, RepoError> {
        let tables = self.tables.lock().await;
        let sum = |kind: LedgerEntryKind| {
            tables
                .ledger
                .iter()
                .filter(|e| e.transaction_type == kind)
                .map(|e| e.amount)
                .sum::<Decimal>()
        };
        Ok(LedgerTotals {
            income: sum(LedgerEntryKind::Income),
            expense: sum(LedgerEntryKind::Expense),
        })
    }
}

#[async_trait]
impl PartitionsRepo for MemoryRepositories {
    async fn create_partition(
        &self,
        params: CreatePartitionParams,
    ) -> Result<PartitionRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if tables.partitions.iter().any(|p| p.name == params.name) {
            return Err(duplicate("partitions_name_key"));
        }
        let now = OffsetDateTime::now_utc();
        let partition = PartitionRecord {
            id: params.id,
            name: params.name,
            description: params.description,
            created_at: now,
            updated_at: now,
            size_bytes: params.size_bytes,
            record_count: params.record_count,
        };
        tables.partitions.push(partition.clone());
        Ok(partition)
    }

    async fn list_partitions(&self, window: Window) -> Result<Vec<PartitionRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(window_of(&tables.partitions, window))
    }

    async fn find_partition(&self, id: Uuid) -> Result<Option<PartitionRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.partitions.iter().find(|p| p.id == id).cloned())
    }

    async fn update_partition(
        &self,
        id: Uuid,
        params: UpdatePartitionParams,
    ) -> Result<PartitionRecord, RepoError> {
        let mut tables = self.tables.lock().await;
        if let Some(name) = params.name.as_deref()
            && tables.partitions.iter().any(|p| p.name == name && p.id != id)
        {
            return Err(duplicate("partitions_name_key"));
        }
        let partition = tables
            .partitions
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;
        if let Some(name) = params.name {
            partition.name = name;
        }
        if params.description.is_some() {
            partition.description = params.description;
        }
        if let Some(size) = params.size_bytes {
            partition.size_bytes = size;
        }
        if let Some(count) = params.record_count {
            partition.record_count = count;
        }
        partition.updated_at = OffsetDateTime::now_utc();
        Ok(partition.clone())
    }

    async fn delete_partition(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        tables.partitions.retain(|p| p.id != id);
        Ok(())
    }
}

#[async_trait]
impl TokenBlacklistRepo for MemoryRepositories {
    async fn blacklist_token(
        &self,
        token_digest: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        let mut tables = self.tables.lock().await;
        tables
            .blacklist
            .entry(token_digest.to_string())
            .or_insert(expires_at);
        Ok(())
    }

    async fn is_token_blacklisted(&self, token_digest: &str) -> Result<bool, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.blacklist.contains_key(token_digest))
    }
}

#[async_trait]
impl JobsRepo for MemoryRepositories {
    async fn enqueue_job(&self, job: NewJobRecord) -> Result<String, RepoError> {
        if self.database_down.load(Ordering::SeqCst) {
            return Err(RepoError::from_persistence("connection refused"));
        }
        let mut tables = self.tables.lock().await;
        let id = Uuid::new_v4().simple().to_string();
        tables.jobs.push(JobRecord {
            id: id.clone(),
            job_type: job.job_type,
            payload: job.payload,
            status: JobState::Pending,
            attempts: 0,
            max_attempts: job.max_attempts,
            run_at: job.run_at,
            done_at: None,
            last_error: None,
            lock_by: None,
            priority: job.priority,
        });
        Ok(id)
    }

    async fn find_job(&self, id: &str) -> Result<Option<JobRecord>, RepoError> {
        let tables = self.tables.lock().await;
        Ok(tables.jobs.iter().find(|job| job.id == id).cloned())
    }
}

#[async_trait]
impl HealthRepo for MemoryRepositories {
    async fn ping(&self) -> Result<(), RepoError> {
        if self.database_down.load(Ordering::SeqCst) {
            return Err(RepoError::Timeout);
        }
        Ok(())
    }
}

pub fn settings() -> Settings {
    Settings {
        server: ServerSettings {
            addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            graceful_shutdown: Duration::from_secs(1),
        },
        logging: LoggingSettings {
            level: LevelFilter::WARN,
            format: LogFormat::Compact,
        },
        database: DatabaseSettings {
            url: None,
            max_connections: NonZeroU32::MIN,
        },
        redis: RedisSettings {
            backend: StoreBackend::Memory,
            cache_url: "redis://127.0.0.1:6379/0".to_string(),
            rate_limit_url: "redis://127.0.0.1:6379/0".to_string(),
        },
        cache: CacheConfig::default(),
        rate_limit: RateLimitSettings {
            default_limit: NonZeroU32::new(100).expect("non-zero"),
            default_period: Duration::from_secs(3600),
        },
        jobs: JobsSettings {
            concurrency: NonZeroU32::new(1).expect("non-zero"),
            sample_task_delay: Duration::ZERO,
        },
        auth: AuthSettings {
            secret_key: "integration-test-secret".to_string(),
            access_token_ttl: Duration::from_secs(30 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            bcrypt_cost: 4,
        },
        app: AppSettings {
            name: "coinpost".to_string(),
            description: "coinpost integration tests".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub repos: Arc<MemoryRepositories>,
    pub cache: Arc<MemoryCacheStore>,
    pub counter: Arc<MemoryRateLimitCounter>,
}

pub fn test_app() -> TestApp {
    test_app_with(settings())
}

pub fn test_app_with(settings: Settings) -> TestApp {
    test_app_with_backends(settings, None, None)
}

/// Like [`test_app_with`], but lets a test swap in its own cache store or
/// rate limit counter. The in-memory ones on `TestApp` are then unused.
pub fn test_app_with_backends(
    settings: Settings,
    cache_store: Option<Arc<dyn CacheStore>>,
    rate_limit: Option<Arc<dyn RateLimitCounter>>,
) -> TestApp {
    let repos = Arc::new(MemoryRepositories::default());
    let cache = Arc::new(MemoryCacheStore::new());
    let counter = Arc::new(MemoryRateLimitCounter::new());
    let backends = RedisBackends {
        cache: cache_store.unwrap_or_else(|| cache.clone() as Arc<dyn CacheStore>),
        rate_limit: rate_limit
            .unwrap_or_else(|| counter.clone() as Arc<dyn RateLimitCounter>),
    };
    let state = ApiState::build(repos.clone(), backends, &settings);

    TestApp {
        router: build_router(state),
        repos,
        cache,
        counter,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        // Extractor rejections answer in plain text.
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    /// Register `username` through the API and return its access token.
    pub async fn signup(&self, username: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/user",
                None,
                Some(json!({
                    "name": format!("User {username}"),
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        self.login(username).await
    }

    pub async fn login(&self, username: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/v1/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }

    /// Insert a superuser directly and log in as it.
    pub async fn superuser(&self, username: &str) -> String {
        let hashed_password = bcrypt::hash(PASSWORD, 4).expect("hash");
        UsersRepo::create_user(
            self.repos.as_ref(),
            CreateUserParams {
                name: "Administrator".to_string(),
                username: username.to_string(),
                email: format!("{username}@example.com"),
                hashed_password,
                profile_image_url: "https://www.profileimageurl.com".to_string(),
                is_superuser: true,
                tier_id: None,
            },
        )
        .await
        .expect("superuser");
        self.login(username).await
    }
}
