//! Domain entities mirrored from persistent storage.

use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::types::{JobState, JobType, LedgerEntryKind};

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub hashed_password: String,
    pub profile_image_url: String,
    pub is_superuser: bool,
    pub tier_id: Option<i64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TierRecord {
    pub id: i64,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct PostRecord {
    pub id: i64,
    pub uuid: Uuid,
    pub created_by_user_id: i64,
    pub title: String,
    pub text: String,
    pub media_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<OffsetDateTime>,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
}

/// Request quota owned by a tier and matched against a sanitized request path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RateLimitRecord {
    pub id: i64,
    pub tier_id: i64,
    pub name: String,
    pub path: String,
    pub limit: i32,
    pub period: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CryptoCurrencyRecord {
    pub id: i64,
    pub name: String,
    pub symbol: String,
    pub price_usd: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct HoldingRecord {
    pub id: i64,
    pub user_id: i64,
    pub crypto_id: i64,
    pub amount: Decimal,
}

/// A holding joined with the currency it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingWithCrypto {
    pub id: i64,
    pub user_id: i64,
    pub crypto_id: i64,
    pub amount: Decimal,
    pub crypto: CryptoCurrencyRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TransferRecord {
    pub transaction_id: i64,
    pub sender: String,
    pub receiver: String,
    pub amount: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct LedgerEntryRecord {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: LedgerEntryKind,
    pub category: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PartitionRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub size_bytes: i64,
    pub record_count: i64,
}

/// A row of the background job queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    pub id: String,
    pub job_type: JobType,
    pub payload: serde_json::Value,
    pub status: JobState,
    pub attempts: i32,
    pub max_attempts: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub run_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub done_at: Option<OffsetDateTime>,
    pub last_error: Option<String>,
    pub lock_by: Option<String>,
    pub priority: i32,
}
