use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, QueryBuilder};

use crate::application::pagination::Window;
use crate::application::repos::{
    CreateLedgerEntryParams, LedgerQueryFilter, LedgerRepo, LedgerTotals, RepoError,
    UpdateLedgerEntryParams,
};
use crate::domain::entities::LedgerEntryRecord;
use crate::domain::types::LedgerEntryKind;

use super::PostgresRepositories;
use super::util::{expect_affected, map_sqlx_error};

const LEDGER_COLUMNS: &str =
    "id, description, amount, transaction_type, category, created_at, updated_at";

#[async_trait]
impl LedgerRepo for PostgresRepositories {
    async fn create_entry(
        &self,
        params: CreateLedgerEntryParams,
    ) -> Result<LedgerEntryRecord, RepoError> {
        let sql = format!(
            "INSERT INTO ledger_entries (description, amount, transaction_type, category) \
             VALUES ($1, $2, $3, $4) RETURNING {LEDGER_COLUMNS}"
        );
        sqlx::query_as::<_, LedgerEntryRecord>(&sql)
            .bind(params.description)
            .bind(params.amount)
            .bind(params.transaction_type)
            .bind(params.category)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_entries(
        &self,
        filter: &LedgerQueryFilter,
        window: Window,
    ) -> Result<Vec<LedgerEntryRecord>, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(LEDGER_COLUMNS);
        qb.push(" FROM ledger_entries WHERE TRUE");
        if let Some(kind) = filter.transaction_type {
            qb.push(" AND transaction_type = ");
            qb.push_bind(kind);
        }
        if let Some(category) = filter.category.as_ref() {
            qb.push(" AND category = ");
            qb.push_bind(category.clone());
        }
        qb.push(" ORDER BY created_at DESC, id DESC OFFSET ");
        qb.push_bind(window.offset_i64());
        qb.push(" LIMIT ");
        qb.push_bind(window.limit_i64());

        qb.build_query_as::<LedgerEntryRecord>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_entry(&self, id: i64) -> Result<Option<LedgerEntryRecord>, RepoError> {
        let sql = format!("SELECT {LEDGER_COLUMNS} FROM ledger_entries WHERE id = $1");
        sqlx::query_as::<_, LedgerEntryRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_entry(
        &self,
        id: i64,
        params: UpdateLedgerEntryParams,
    ) -> Result<LedgerEntryRecord, RepoError> {
        let sql = format!(
            "UPDATE ledger_entries SET \
                description = COALESCE($2, description), \
                amount = COALESCE($3, amount), \
                transaction_type = COALESCE($4, transaction_type), \
                category = COALESCE($5, category), \
                updated_at = now() \
             WHERE id = $1 RETURNING {LEDGER_COLUMNS}"
        );
        sqlx::query_as::<_, LedgerEntryRecord>(&sql)
            .bind(id)
            .bind(params.description)
            .bind(params.amount)
            .bind(params.transaction_type)
            .bind(params.category)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn delete_entry(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM ledger_entries WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected())
    }

    async fn totals(&self) -> Result<LedgerTotals, RepoError> {
        let (income, expense) = sqlx::query_as::<_, (Decimal, Decimal)>(
            "SELECT \
                COALESCE(SUM(amount) FILTER (WHERE transaction_type = $1), 0), \
                COALESCE(SUM(amount) FILTER (WHERE transaction_type = $2), 0) \
             FROM ledger_entries",
        )
        .bind(LedgerEntryKind::Income)
        .bind(LedgerEntryKind::Expense)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(LedgerTotals { income, expense })
    }
}
