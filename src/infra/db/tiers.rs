use async_trait::async_trait;

use crate::application::pagination::Window;
use crate::application::repos::{RepoError, TiersRepo};
use crate::domain::entities::TierRecord;

use super::PostgresRepositories;
use super::util::{convert_count, expect_affected, map_sqlx_error};

#[async_trait]
impl TiersRepo for PostgresRepositories {
    async fn create_tier(&self, name: &str) -> Result<TierRecord, RepoError> {
        sqlx::query_as::<_, TierRecord>(
            "INSERT INTO tiers (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_tier_by_id(&self, id: i64) -> Result<Option<TierRecord>, RepoError> {
        sqlx::query_as::<_, TierRecord>("SELECT id, name, created_at FROM tiers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_tier_by_name(&self, name: &str) -> Result<Option<TierRecord>, RepoError> {
        sqlx::query_as::<_, TierRecord>("SELECT id, name, created_at FROM tiers WHERE name = $1")
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_tiers(&self, window: Window) -> Result<(Vec<TierRecord>, u64), RepoError> {
        let tiers = sqlx::query_as::<_, TierRecord>(
            "SELECT id, name, created_at FROM tiers ORDER BY id ASC OFFSET $1 LIMIT $2",
        )
        .bind(window.offset_i64())
        .bind(window.limit_i64())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM tiers")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok((tiers, convert_count(total)?))
    }

    async fn rename_tier(&self, id: i64, name: &str) -> Result<TierRecord, RepoError> {
        sqlx::query_as::<_, TierRecord>(
            "UPDATE tiers SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn delete_tier(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tiers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
