use async_trait::async_trait;
use time::OffsetDateTime;

use crate::application::repos::{RepoError, TokenBlacklistRepo};

use super::PostgresRepositories;
use super::util::map_sqlx_error;

#[async_trait]
impl TokenBlacklistRepo for PostgresRepositories {
    async fn blacklist_token(
        &self,
        token_digest: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), RepoError> {
        sqlx::query(
            "INSERT INTO token_blacklist (token_digest, expires_at) VALUES ($1, $2) \
             ON CONFLICT (token_digest) DO NOTHING",
        )
        .bind(token_digest)
        .bind(expires_at)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        // Entries past their expiry can never match a valid token again.
        sqlx::query("DELETE FROM token_blacklist WHERE expires_at < now()")
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn is_token_blacklisted(&self, token_digest: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM token_blacklist WHERE token_digest = $1)",
        )
        .bind(token_digest)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }
}
