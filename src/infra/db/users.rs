use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::Window;
use crate::application::repos::{CreateUserParams, RepoError, UpdateUserParams, UsersRepo};
use crate::domain::entities::UserRecord;

use super::PostgresRepositories;
use super::util::{convert_count, expect_affected, map_sqlx_error};

const USER_COLUMNS: &str = "id, uuid, name, username, email, hashed_password, profile_image_url, \
    is_superuser, tier_id, created_at, updated_at, deleted_at, is_deleted";

#[async_trait]
impl UsersRepo for PostgresRepositories {
    async fn create_user(&self, params: CreateUserParams) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "INSERT INTO users (uuid, name, username, email, hashed_password, profile_image_url, \
             is_superuser, tier_id) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.name)
            .bind(params.username)
            .bind(params.email)
            .bind(params.hashed_password)
            .bind(params.profile_image_url)
            .bind(params.is_superuser)
            .bind(params.tier_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
        include_deleted: bool,
    ) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND ($2 OR is_deleted = FALSE)"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(username)
            .bind(include_deleted)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_user_by_login(&self, login: &str) -> Result<Option<UserRecord>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE (username = $1 OR email = $1) AND is_deleted = FALSE"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(login)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn username_exists(&self, username: &str) -> Result<bool, RepoError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_active_users(
        &self,
        window: Window,
    ) -> Result<(Vec<UserRecord>, u64), RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_deleted = FALSE \
             ORDER BY id ASC OFFSET $1 LIMIT $2"
        );
        let users = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(window.offset_i64())
            .bind(window.limit_i64())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE is_deleted = FALSE")
                .fetch_one(self.pool())
                .await
                .map_err(map_sqlx_error)?;

        Ok((users, convert_count(total)?))
    }

    async fn update_user(
        &self,
        id: i64,
        params: UpdateUserParams,
    ) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                username = COALESCE($3, username), \
                email = COALESCE($4, email), \
                profile_image_url = COALESCE($5, profile_image_url), \
                updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .bind(params.name)
            .bind(params.username)
            .bind(params.email)
            .bind(params.profile_image_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn set_user_tier(&self, id: i64, tier_id: i64) -> Result<UserRecord, RepoError> {
        let sql = format!(
            "UPDATE users SET tier_id = $2, updated_at = now() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(id)
            .bind(tier_id)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn soft_delete_user(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE users SET is_deleted = TRUE, deleted_at = now() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn hard_delete_user(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
