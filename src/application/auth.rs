//! Password hashing, HS256 bearer tokens and the revocation list.

use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{RepoError, TokenBlacklistRepo, UsersRepo};
use crate::config::AuthSettings;
use crate::domain::entities::UserRecord;
use crate::domain::types::TokenKind;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("token is malformed")]
    MalformedToken,
    #[error("token signature does not match")]
    BadSignature,
    #[error("token has expired")]
    Expired,
    #[error("token has been revoked")]
    Revoked,
    #[error("expected a {expected:?} token")]
    WrongKind { expected: TokenKind },
    #[error("token subject no longer exists")]
    UnknownSubject,
    #[error("signing key rejected: {0}")]
    Key(String),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenKind,
    /// Unique per issued token so revoking one never affects a sibling.
    pub jti: Uuid,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Result<OffsetDateTime, AuthError> {
        OffsetDateTime::from_unix_timestamp(self.exp).map_err(|_| AuthError::MalformedToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
}

/// Token lifetimes and hashing cost derived from configuration.
#[derive(Clone)]
pub struct TokenPolicy {
    secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl TokenPolicy {
    pub fn new(
        secret: impl Into<Vec<u8>>,
        access_ttl: Duration,
        refresh_ttl: Duration,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
            refresh_ttl,
            bcrypt_cost,
        }
    }

    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

impl From<&AuthSettings> for TokenPolicy {
    fn from(settings: &AuthSettings) -> Self {
        Self::new(
            settings.secret_key.as_bytes().to_vec(),
            settings.access_token_ttl,
            settings.refresh_token_ttl,
            settings.bcrypt_cost,
        )
    }
}

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UsersRepo>,
    blacklist: Arc<dyn TokenBlacklistRepo>,
    policy: TokenPolicy,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UsersRepo>,
        blacklist: Arc<dyn TokenBlacklistRepo>,
        policy: TokenPolicy,
    ) -> Self {
        Self {
            users,
            blacklist,
            policy,
        }
    }

    pub async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_owned();
        let cost = self.policy.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    pub async fn verify_password(&self, password: &str, hashed: &str) -> Result<bool, AuthError> {
        let password = password.to_owned();
        let hashed = hashed.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed))
            .await
            .map_err(|err| AuthError::Hashing(err.to_string()))?
            .map_err(|err| AuthError::Hashing(err.to_string()))
    }

    /// Username or email plus password in, access and refresh tokens out.
    pub async fn login(&self, login: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .users
            .find_user_by_login(login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &user.hashed_password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        let now = OffsetDateTime::now_utc();
        Ok(TokenPair {
            access_token: self.issue(&user.username, TokenKind::Access, now)?,
            refresh_token: self.issue(&user.username, TokenKind::Refresh, now)?,
            token_type: "bearer",
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AccessToken, AuthError> {
        let claims = self.verify_live(refresh_token, TokenKind::Refresh).await?;
        self.users
            .find_user_by_username(&claims.sub, false)
            .await?
            .ok_or(AuthError::UnknownSubject)?;

        Ok(AccessToken {
            access_token: self.issue(&claims.sub, TokenKind::Access, OffsetDateTime::now_utc())?,
            token_type: "bearer",
        })
    }

    /// Resolve the active user behind an access token.
    pub async fn authenticate(&self, access_token: &str) -> Result<UserRecord, AuthError> {
        let claims = self.verify_live(access_token, TokenKind::Access).await?;
        self.users
            .find_user_by_username(&claims.sub, false)
            .await?
            .ok_or(AuthError::UnknownSubject)
    }

    /// Add a still-valid token to the revocation list until it expires.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let claims = self.decode(token, OffsetDateTime::now_utc())?;
        self.blacklist
            .blacklist_token(&token_digest(token), claims.expires_at()?)
            .await?;
        Ok(())
    }

    pub async fn logout(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
    ) -> Result<(), AuthError> {
        self.revoke(access_token).await?;
        if let Some(refresh) = refresh_token {
            match self.revoke(refresh).await {
                Ok(()) | Err(AuthError::Expired) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> Result<String, AuthError> {
        let ttl = time::Duration::try_from(self.policy.ttl(kind))
            .map_err(|err| AuthError::Key(err.to_string()))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            token_type: kind,
            jti: Uuid::new_v4(),
        };
        let payload =
            serde_json::to_vec(&claims).map_err(|err| AuthError::Key(err.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(TOKEN_HEADER),
            URL_SAFE_NO_PAD.encode(payload)
        );
        let signature = self.sign(signing_input.as_bytes())?;
        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Check signature and expiry against `now`.
    pub fn decode(&self, token: &str, now: OffsetDateTime) -> Result<TokenClaims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::MalformedToken);
        };

        let provided = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::MalformedToken)?;
        let expected = self.sign(format!("{header}.{payload}").as_bytes())?;
        if expected.ct_eq(&provided).unwrap_u8() == 0 {
            return Err(AuthError::BadSignature);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::MalformedToken)?;
        let claims: TokenClaims =
            serde_json::from_slice(&bytes).map_err(|_| AuthError::MalformedToken)?;

        if claims.exp <= now.unix_timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    async fn verify_live(&self, token: &str, kind: TokenKind) -> Result<TokenClaims, AuthError> {
        let claims = self.decode(token, OffsetDateTime::now_utc())?;
        if claims.token_type != kind {
            return Err(AuthError::WrongKind { expected: kind });
        }
        if self
            .blacklist
            .is_token_blacklisted(&token_digest(token))
            .await?
        {
            return Err(AuthError::Revoked);
        }
        Ok(claims)
    }

    fn sign(&self, input: &[u8]) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha256::new_from_slice(&self.policy.secret)
            .map_err(|err| AuthError::Key(err.to_string()))?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

/// Tokens are stored hashed so the revocation list never holds usable credentials.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
