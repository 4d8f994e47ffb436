use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::application::auth::{AuthError, AuthService};
use crate::application::pagination::{PageRequest, PaginatedList};
use crate::application::repos::{
    CreateUserParams, RateLimitsRepo, RepoError, TiersRepo, UpdateUserParams, UsersRepo,
};
use crate::domain::entities::{RateLimitRecord, TierRecord, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::validation;

pub const DEFAULT_PROFILE_IMAGE_URL: &str = "https://www.profileimageurl.com";

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("{0}")]
    Duplicate(&'static str),
    #[error("{0}")]
    NotFound(&'static str),
    #[error("caller may not modify this account")]
    Forbidden,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUserCommand {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserWithRateLimits {
    #[serde(flatten)]
    pub user: UserRecord,
    pub tier_rate_limits: Vec<RateLimitRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserWithTier {
    #[serde(flatten)]
    pub user: UserRecord,
    pub tier: Option<TierRecord>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UsersRepo>,
    tiers: Arc<dyn TiersRepo>,
    rate_limits: Arc<dyn RateLimitsRepo>,
    auth: Arc<AuthService>,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        tiers: Arc<dyn TiersRepo>,
        rate_limits: Arc<dyn RateLimitsRepo>,
        auth: Arc<AuthService>,
    ) -> Self {
        Self {
            users,
            tiers,
            rate_limits,
            auth,
        }
    }

    pub async fn register(
        &self,
        command: CreateUserCommand,
    ) -> Result<UserRecord, UserServiceError> {
        self.create(command, false, None).await
    }

    /// Used by the bootstrap command to seed the first administrator.
    pub async fn register_superuser(
        &self,
        command: CreateUserCommand,
        tier_id: Option<i64>,
    ) -> Result<UserRecord, UserServiceError> {
        self.create(command, true, tier_id).await
    }

    async fn create(
        &self,
        command: CreateUserCommand,
        is_superuser: bool,
        tier_id: Option<i64>,
    ) -> Result<UserRecord, UserServiceError> {
        validation::display_name(&command.name)?;
        validation::username(&command.username)?;
        validation::email(&command.email)?;
        validation::password(&command.password)?;

        if self.users.email_exists(&command.email).await? {
            return Err(UserServiceError::Duplicate("Email is already registered"));
        }
        if self.users.username_exists(&command.username).await? {
            return Err(UserServiceError::Duplicate("Username not available"));
        }

        let hashed_password = self.auth.hash_password(&command.password).await?;
        let user = self
            .users
            .create_user(CreateUserParams {
                name: command.name,
                username: command.username,
                email: command.email,
                hashed_password,
                profile_image_url: DEFAULT_PROFILE_IMAGE_URL.to_string(),
                is_superuser,
                tier_id,
            })
            .await?;
        tracing::info!(
            target = "coinpost::users",
            user_id = user.id,
            username = %user.username,
            "user registered"
        );
        Ok(user)
    }

    pub async fn list(
        &self,
        request: PageRequest,
    ) -> Result<PaginatedList<UserRecord>, UserServiceError> {
        let (users, total) = self.users.list_active_users(request.window()).await?;
        Ok(PaginatedList::new(users, total, request))
    }

    pub async fn find_active(&self, username: &str) -> Result<UserRecord, UserServiceError> {
        self.users
            .find_user_by_username(username, false)
            .await?
            .ok_or(UserServiceError::NotFound("User not found"))
    }

    pub async fn update(
        &self,
        actor: &UserRecord,
        username: &str,
        command: UpdateUserCommand,
    ) -> Result<UserRecord, UserServiceError> {
        let target = self
            .users
            .find_user_by_username(username, true)
            .await?
            .ok_or(UserServiceError::NotFound("User not found"))?;
        if actor.id != target.id {
            return Err(UserServiceError::Forbidden);
        }

        if let Some(name) = command.name.as_deref() {
            validation::display_name(name)?;
        }
        if let Some(url) = command.profile_image_url.as_deref() {
            validation::web_url("profile_image_url", url)?;
        }
        if let Some(new_username) = command.username.as_deref() {
            validation::username(new_username)?;
            if new_username != target.username && self.users.username_exists(new_username).await?
            {
                return Err(UserServiceError::Duplicate("Username not available"));
            }
        }
        if let Some(new_email) = command.email.as_deref() {
            validation::email(new_email)?;
            if new_email != target.email && self.users.email_exists(new_email).await? {
                return Err(UserServiceError::Duplicate("Email is already registered"));
            }
        }

        self.users
            .update_user(
                target.id,
                UpdateUserParams {
                    name: command.name,
                    username: command.username,
                    email: command.email,
                    profile_image_url: command.profile_image_url,
                },
            )
            .await
            .map_err(UserServiceError::from)
    }

    /// Soft delete by the owner, revoking the token the request was made with.
    pub async fn delete(
        &self,
        actor: &UserRecord,
        username: &str,
        access_token: &str,
    ) -> Result<(), UserServiceError> {
        let target = self
            .users
            .find_user_by_username(username, false)
            .await?
            .ok_or(UserServiceError::NotFound("User not found"))?;
        if actor.id != target.id {
            return Err(UserServiceError::Forbidden);
        }

        self.users.soft_delete_user(target.id).await?;
        self.auth.revoke(access_token).await?;
        Ok(())
    }

    pub async fn hard_delete(&self, username: &str) -> Result<(), UserServiceError> {
        let target = self
            .users
            .find_user_by_username(username, true)
            .await?
            .ok_or(UserServiceError::NotFound("User not found"))?;
        self.users.hard_delete_user(target.id).await?;
        tracing::info!(
            target = "coinpost::users",
            user_id = target.id,
            "user removed from database"
        );
        Ok(())
    }

    pub async fn with_rate_limits(
        &self,
        username: &str,
    ) -> Result<UserWithRateLimits, UserServiceError> {
        let user = self.find_any(username).await?;
        let Some(tier_id) = user.tier_id else {
            return Ok(UserWithRateLimits {
                user,
                tier_rate_limits: Vec::new(),
            });
        };

        let tier = self
            .tiers
            .find_tier_by_id(tier_id)
            .await?
            .ok_or(UserServiceError::NotFound("Tier not found"))?;
        let tier_rate_limits = self.rate_limits.list_rate_limits_for_tier(tier.id).await?;

        Ok(UserWithRateLimits {
            user,
            tier_rate_limits,
        })
    }

    pub async fn with_tier(&self, username: &str) -> Result<UserWithTier, UserServiceError> {
        let user = self.find_active(username).await?;
        let tier = match user.tier_id {
            Some(tier_id) => self.tiers.find_tier_by_id(tier_id).await?,
            None => None,
        };
        Ok(UserWithTier { user, tier })
    }

    pub async fn set_tier(
        &self,
        username: &str,
        tier_id: i64,
    ) -> Result<UserRecord, UserServiceError> {
        let user = self.find_any(username).await?;
        self.tiers
            .find_tier_by_id(tier_id)
            .await?
            .ok_or(UserServiceError::NotFound("Tier not found"))?;
        self.users
            .set_user_tier(user.id, tier_id)
            .await
            .map_err(UserServiceError::from)
    }

    async fn find_any(&self, username: &str) -> Result<UserRecord, UserServiceError> {
        self.users
            .find_user_by_username(username, true)
            .await?
            .ok_or(UserServiceError::NotFound("User not found"))
    }
}
