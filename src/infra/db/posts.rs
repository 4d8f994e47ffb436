use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::Window;
use crate::application::repos::{CreatePostParams, PostsRepo, RepoError, UpdatePostParams};
use crate::domain::entities::PostRecord;

use super::PostgresRepositories;
use super::util::{convert_count, expect_affected, map_sqlx_error};

const POST_COLUMNS: &str = "id, uuid, created_by_user_id, title, text, media_url, created_at, \
    updated_at, deleted_at, is_deleted";

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "INSERT INTO posts (uuid, created_by_user_id, title, text, media_url) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, PostRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(params.created_by_user_id)
            .bind(params.title)
            .bind(params.text)
            .bind(params.media_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_post(
        &self,
        id: i64,
        author_id: Option<i64>,
    ) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE id = $1 AND is_deleted = FALSE \
               AND ($2::BIGINT IS NULL OR created_by_user_id = $2)"
        );
        sqlx::query_as::<_, PostRecord>(&sql)
            .bind(id)
            .bind(author_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_posts_by_author(
        &self,
        author_id: i64,
        window: Window,
    ) -> Result<(Vec<PostRecord>, u64), RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE created_by_user_id = $1 AND is_deleted = FALSE \
             ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3"
        );
        let posts = sqlx::query_as::<_, PostRecord>(&sql)
            .bind(author_id)
            .bind(window.offset_i64())
            .bind(window.limit_i64())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM posts WHERE created_by_user_id = $1 AND is_deleted = FALSE",
        )
        .bind(author_id)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok((posts, convert_count(total)?))
    }

    async fn update_post(
        &self,
        id: i64,
        params: UpdatePostParams,
    ) -> Result<PostRecord, RepoError> {
        let sql = format!(
            "UPDATE posts SET \
                title = COALESCE($2, title), \
                text = COALESCE($3, text), \
                media_url = COALESCE($4, media_url), \
                updated_at = now() \
             WHERE id = $1 AND is_deleted = FALSE RETURNING {POST_COLUMNS}"
        );
        sqlx::query_as::<_, PostRecord>(&sql)
            .bind(id)
            .bind(params.title)
            .bind(params.text)
            .bind(params.media_url)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn soft_delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE posts SET is_deleted = TRUE, deleted_at = now() \
             WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn hard_delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
