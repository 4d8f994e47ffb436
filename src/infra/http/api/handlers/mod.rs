//! API handlers organized by resource type.
//!
//! Error conversions are shared here so every resource maps service failures
//! onto the same status codes and error codes.

mod accounting;
mod crypto;
mod finance;
mod health;
mod jobs;
mod partitions;
mod posts;
mod rate_limits;
mod session;
mod tiers;
mod users;

pub use accounting::*;
pub use crypto::*;
pub use finance::*;
pub use health::*;
pub use jobs::*;
pub use partitions::*;
pub use posts::*;
pub use rate_limits::*;
pub use session::*;
pub use tiers::*;
pub use users::*;

// ----- Shared query structs -----

use serde::Deserialize;

use crate::application::pagination::{PageRequest, Window};
use crate::domain::types::LedgerEntryKind;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub items_per_page: Option<u32>,
}

impl PageQuery {
    pub fn request(&self) -> Result<PageRequest, ApiError> {
        PageRequest::new(self.page, self.items_per_page).map_err(|err| {
            ApiError::new(
                StatusCode::BAD_REQUEST,
                codes::INVALID_PAGINATION,
                "Invalid pagination parameters",
                Some(err.to_string()),
            )
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SkipLimitQuery {
    pub skip: Option<u64>,
    pub limit: Option<u32>,
}

impl SkipLimitQuery {
    pub fn window(&self) -> Window {
        Window::new(self.skip, self.limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StartCountQuery {
    pub start: Option<u64>,
    pub count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LedgerListQuery {
    pub skip: Option<u64>,
    pub limit: Option<u32>,
    pub transaction_type: Option<LedgerEntryKind>,
    pub category: Option<String>,
}

// ----- Shared error conversions -----

use axum::http::StatusCode;

use crate::application::auth::AuthError;
use crate::application::crypto::CryptoServiceError;
use crate::application::jobs::JobServiceError;
use crate::application::ledger::LedgerServiceError;
use crate::application::partitions::PartitionServiceError;
use crate::application::posts::PostServiceError;
use crate::application::rate_limits::RateLimitServiceError;
use crate::application::repos::RepoError;
use crate::application::tiers::TierServiceError;
use crate::application::transfers::TransferServiceError;
use crate::application::users::UserServiceError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

pub(crate) fn domain_to_api(err: DomainError) -> ApiError {
    match err {
        DomainError::Validation { .. } => ApiError::invalid_input(err.to_string()),
        DomainError::NotFound { .. } => ApiError::not_found("Resource not found"),
        DomainError::Invariant { message } => ApiError::internal(codes::INTERNAL, message),
    }
}

pub(crate) fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::InvalidCredentials => {
            ApiError::unauthorized("Incorrect username or password", None)
        }
        AuthError::MalformedToken
        | AuthError::BadSignature
        | AuthError::Expired
        | AuthError::Revoked
        | AuthError::WrongKind { .. }
        | AuthError::UnknownSubject => {
            ApiError::unauthorized("Could not validate credentials", Some(err.to_string()))
        }
        AuthError::Key(_) | AuthError::Hashing(_) => {
            ApiError::internal(codes::AUTH, err.to_string())
        }
        AuthError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn user_to_api(err: UserServiceError) -> ApiError {
    match err {
        UserServiceError::Invalid(err) => domain_to_api(err),
        UserServiceError::Duplicate(message) => ApiError::conflict(message),
        UserServiceError::NotFound(message) => ApiError::not_found(message),
        UserServiceError::Forbidden => ApiError::forbidden(),
        UserServiceError::Auth(err) => auth_to_api(err),
        UserServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn tier_to_api(err: TierServiceError) -> ApiError {
    match err {
        TierServiceError::Invalid(err) => domain_to_api(err),
        TierServiceError::Duplicate => ApiError::conflict("Tier Name not available"),
        TierServiceError::NotFound => ApiError::not_found("Tier not found"),
        TierServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn post_to_api(err: PostServiceError) -> ApiError {
    match err {
        PostServiceError::Invalid(err) => domain_to_api(err),
        PostServiceError::NotFound(message) => ApiError::not_found(message),
        PostServiceError::Forbidden => ApiError::forbidden(),
        PostServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn rate_limit_to_api(err: RateLimitServiceError) -> ApiError {
    match err {
        RateLimitServiceError::Invalid(err) => domain_to_api(err),
        RateLimitServiceError::Duplicate => ApiError::conflict("Rate Limit Name not available"),
        RateLimitServiceError::NotFound(message) => ApiError::not_found(message),
        RateLimitServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn crypto_to_api(err: CryptoServiceError) -> ApiError {
    match err {
        CryptoServiceError::Invalid(err) => domain_to_api(err),
        CryptoServiceError::AlreadyExists => ApiError::bad_request("Crypto already exists", None),
        CryptoServiceError::NotFound => ApiError::not_found("Crypto not found"),
        CryptoServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn transfer_to_api(err: TransferServiceError) -> ApiError {
    match err {
        TransferServiceError::Invalid(err) => domain_to_api(err),
        TransferServiceError::NotFound => ApiError::not_found("Transaction not found"),
        TransferServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn ledger_to_api(err: LedgerServiceError) -> ApiError {
    match err {
        LedgerServiceError::Invalid(err) => domain_to_api(err),
        LedgerServiceError::NotFound => ApiError::not_found("Transaction not found"),
        LedgerServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn job_to_api(err: JobServiceError) -> ApiError {
    match err {
        JobServiceError::Invalid(err) => domain_to_api(err),
        JobServiceError::Encode(err) => ApiError::internal(codes::JOBS, err.to_string()),
        JobServiceError::Repo(err) => repo_to_api(err),
    }
}

pub(crate) fn partition_to_api(err: PartitionServiceError) -> ApiError {
    match err {
        PartitionServiceError::Invalid(err) => domain_to_api(err),
        PartitionServiceError::Duplicate => ApiError::conflict("Partition name already exists"),
        PartitionServiceError::NotFound => ApiError::not_found("Partition not found"),
        PartitionServiceError::Repo(err) => repo_to_api(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_unprocessable() {
        let err = user_to_api(UserServiceError::Invalid(DomainError::validation(
            "username",
            "must be lowercase",
        )));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), codes::INVALID_INPUT);
    }

    #[test]
    fn duplicates_map_to_conflict() {
        let err = tier_to_api(TierServiceError::Duplicate);
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err = repo_to_api(RepoError::Duplicate {
            constraint: "users_email_key".to_string(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn token_failures_are_unauthorized() {
        for err in [AuthError::Expired, AuthError::Revoked, AuthError::BadSignature] {
            assert_eq!(auth_to_api(err).status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn existing_crypto_is_a_bad_request() {
        let err = crypto_to_api(CryptoServiceError::AlreadyExists);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn blank_task_message_is_unprocessable() {
        let err = job_to_api(JobServiceError::Invalid(DomainError::validation(
            "task_message",
            "must not be empty",
        )));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn page_zero_is_rejected() {
        let query = PageQuery {
            page: Some(0),
            items_per_page: None,
        };
        let err = query.request().expect_err("page 0");
        assert_eq!(err.code(), codes::INVALID_PAGINATION);
    }
}
