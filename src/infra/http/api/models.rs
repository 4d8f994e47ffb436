use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::LedgerEntryKind;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserCreateRequest {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserTierUpdateRequest {
    pub tier_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TierCreateRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct TierUpdateRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PostCreateRequest {
    pub title: String,
    pub text: String,
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostUpdateRequest {
    pub title: Option<String>,
    pub text: Option<String>,
    pub media_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitCreateRequest {
    pub name: String,
    pub path: String,
    pub limit: i32,
    pub period: i32,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitUpdateRequest {
    pub name: Option<String>,
    pub path: Option<String>,
    pub limit: Option<i32>,
    pub period: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CryptoCreateRequest {
    pub name: String,
    pub symbol: String,
    pub price_usd: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CryptoPriceUpdateRequest {
    pub price_usd: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct HoldingCreateRequest {
    pub crypto_id: i64,
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct TransferCreateRequest {
    pub sender: String,
    pub receiver: String,
    pub amount: Decimal,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct LedgerEntryCreateRequest {
    pub description: String,
    pub amount: Decimal,
    pub transaction_type: LedgerEntryKind,
    pub category: String,
}

#[derive(Debug, Deserialize)]
pub struct LedgerEntryUpdateRequest {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    pub transaction_type: Option<LedgerEntryKind>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PartitionCreateRequest {
    pub name: String,
    pub description: Option<String>,
    pub size_bytes: Option<i64>,
    pub record_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PartitionUpdateRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub size_bytes: Option<i64>,
    pub record_count: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

#[derive(Debug, Deserialize)]
pub struct EnqueueJobQuery {
    pub task_message: String,
}

#[derive(Debug, Serialize)]
pub struct JobCreatedResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub database: &'static str,
}
