use async_trait::async_trait;

use crate::application::pagination::Window;
use crate::application::repos::{CreateTransferParams, RepoError, TransfersRepo};
use crate::domain::entities::TransferRecord;

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const TRANSFER_COLUMNS: &str = "transaction_id, sender, receiver, amount, timestamp";

#[async_trait]
impl TransfersRepo for PostgresRepositories {
    async fn create_transfer(
        &self,
        params: CreateTransferParams,
    ) -> Result<TransferRecord, RepoError> {
        let sql = format!(
            "INSERT INTO transactions (sender, receiver, amount, timestamp) \
             VALUES ($1, $2, $3, $4) RETURNING {TRANSFER_COLUMNS}"
        );
        sqlx::query_as::<_, TransferRecord>(&sql)
            .bind(params.sender)
            .bind(params.receiver)
            .bind(params.amount)
            .bind(params.timestamp)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_transfers(&self, window: Window) -> Result<Vec<TransferRecord>, RepoError> {
        let sql = format!(
            "SELECT {TRANSFER_COLUMNS} FROM transactions \
             ORDER BY transaction_id ASC OFFSET $1 LIMIT $2"
        );
        sqlx::query_as::<_, TransferRecord>(&sql)
            .bind(window.offset_i64())
            .bind(window.limit_i64())
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_transfer(&self, id: i64) -> Result<Option<TransferRecord>, RepoError> {
        let sql = format!("SELECT {TRANSFER_COLUMNS} FROM transactions WHERE transaction_id = $1");
        sqlx::query_as::<_, TransferRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }
}
