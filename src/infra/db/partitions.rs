use async_trait::async_trait;
use uuid::Uuid;

use crate::application::pagination::Window;
use crate::application::repos::{
    CreatePartitionParams, PartitionsRepo, RepoError, UpdatePartitionParams,
};
use crate::domain::entities::PartitionRecord;

use super::PostgresRepositories;
use super::util::{expect_affected, map_sqlx_error};

const PARTITION_COLUMNS: &str =
    "id, name, description, created_at, updated_at, size_bytes, record_count";

#[async_trait]
impl PartitionsRepo for PostgresRepositories {
    async fn create_partition(
        &self,
        params: CreatePartitionParams,
    ) -> Result<PartitionRecord, RepoError> {
        let sql = format!(
            "INSERT INTO partitions (id, name, description, size_bytes, record_count) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {PARTITION_COLUMNS}"
        );
        sqlx::query_as::<_, PartitionRecord>(&sql)
            .bind(params.id)
            .bind(params.name)
            .bind(params.description)
            .bind(params.size_bytes)
            .bind(params.record_count)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_partitions(&self, window: Window) -> Result<Vec<PartitionRecord>, RepoError> {
        let sql = format!(
            "SELECT {PARTITION_COLUMNS} FROM partitions ORDER BY created_at ASC, id ASC \
             OFFSET $1 LIMIT $2"
        );
        sqlx::query_as::<_, PartitionRecord>(&sql)
            .bind(window.offset_i64())
            .bind(window.limit_i64())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_partition(&self, id: Uuid) -> Result<Option<PartitionRecord>, RepoError> {
        let sql = format!("SELECT {PARTITION_COLUMNS} FROM partitions WHERE id = $1");
        sqlx::query_as::<_, PartitionRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_partition(
        &self,
        id: Uuid,
        params: UpdatePartitionParams,
    ) -> Result<PartitionRecord, RepoError> {
        let sql = format!(
            "UPDATE partitions SET \
                name = COALESCE($2, name), \
                description = COALESCE($3, description), \
                size_bytes = COALESCE($4, size_bytes), \
                record_count = COALESCE($5, record_count), \
                updated_at = now() \
             WHERE id = $1 RETURNING {PARTITION_COLUMNS}"
        );
        sqlx::query_as::<_, PartitionRecord>(&sql)
            .bind(id)
            .bind(params.name)
            .bind(params.description)
            .bind(params.size_bytes)
            .bind(params.record_count)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_partition(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM partitions WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }
}
