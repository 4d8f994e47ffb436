use async_trait::async_trait;

use crate::application::pagination::Window;
use crate::application::repos::{
    CreateRateLimitParams, RateLimitsRepo, RepoError, UpdateRateLimitParams,
};
use crate::domain::entities::RateLimitRecord;

use super::PostgresRepositories;
use super::util::{convert_count, expect_affected, map_sqlx_error};

// `limit` is reserved in SQL and must stay quoted.
const RATE_LIMIT_COLUMNS: &str =
    r#"id, tier_id, name, path, "limit", period, created_at, updated_at"#;

#[async_trait]
impl RateLimitsRepo for PostgresRepositories {
    async fn create_rate_limit(
        &self,
        params: CreateRateLimitParams,
    ) -> Result<RateLimitRecord, RepoError> {
        let sql = format!(
            r#"INSERT INTO rate_limits (tier_id, name, path, "limit", period)
               VALUES ($1, $2, $3, $4, $5) RETURNING {RATE_LIMIT_COLUMNS}"#
        );
        sqlx::query_as::<_, RateLimitRecord>(&sql)
            .bind(params.tier_id)
            .bind(params.name)
            .bind(params.path)
            .bind(params.limit)
            .bind(params.period)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn rate_limit_name_exists(&self, name: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rate_limits WHERE name = $1)")
            .bind(name)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_rate_limit(
        &self,
        tier_id: i64,
        id: i64,
    ) -> Result<Option<RateLimitRecord>, RepoError> {
        let sql =
            format!("SELECT {RATE_LIMIT_COLUMNS} FROM rate_limits WHERE tier_id = $1 AND id = $2");
        sqlx::query_as::<_, RateLimitRecord>(&sql)
            .bind(tier_id)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_rate_limit_for_path(
        &self,
        tier_id: i64,
        path: &str,
    ) -> Result<Option<RateLimitRecord>, RepoError> {
        let sql = format!(
            "SELECT {RATE_LIMIT_COLUMNS} FROM rate_limits \
             WHERE tier_id = $1 AND path = $2 ORDER BY id ASC LIMIT 1"
        );
        sqlx::query_as::<_, RateLimitRecord>(&sql)
            .bind(tier_id)
            .bind(path)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_rate_limits(
        &self,
        tier_id: i64,
        window: Window,
    ) -> Result<(Vec<RateLimitRecord>, u64), RepoError> {
        let sql = format!(
            "SELECT {RATE_LIMIT_COLUMNS} FROM rate_limits WHERE tier_id = $1 \
             ORDER BY id ASC OFFSET $2 LIMIT $3"
        );
        let limits = sqlx::query_as::<_, RateLimitRecord>(&sql)
            .bind(tier_id)
            .bind(window.offset_i64())
            .bind(window.limit_i64())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM rate_limits WHERE tier_id = $1")
                .bind(tier_id)
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok((limits, convert_count(total)?))
    }

    async fn list_rate_limits_for_tier(
        &self,
        tier_id: i64,
    ) -> Result<Vec<RateLimitRecord>, RepoError> {
        let sql = format!(
            "SELECT {RATE_LIMIT_COLUMNS} FROM rate_limits WHERE tier_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, RateLimitRecord>(&sql)
            .bind(tier_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_rate_limit(
        &self,
        id: i64,
        params: UpdateRateLimitParams,
    ) -> Result<RateLimitRecord, RepoError> {
        let sql = format!(
            r#"UPDATE rate_limits SET
                   name = COALESCE($2, name),
                   path = COALESCE($3, path),
                   "limit" = COALESCE($4, "limit"),
                   period = COALESCE($5, period),
                   updated_at = now()
               WHERE id = $1 RETURNING {RATE_LIMIT_COLUMNS}"#
        );
        sqlx::query_as::<_, RateLimitRecord>(&sql)
            .bind(id)
            .bind(params.name)
            .bind(params.path)
            .bind(params.limit)
            .bind(params.period)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_rate_limit(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM rate_limits WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
