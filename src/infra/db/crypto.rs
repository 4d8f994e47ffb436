use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::repos::{CreateCryptoParams, CryptoRepo, RepoError};
use crate::domain::entities::{CryptoCurrencyRecord, HoldingRecord, HoldingWithCrypto};

use super::PostgresRepositories;
use super::util::map_sqlx_error;

const CRYPTO_COLUMNS: &str = "id, name, symbol, price_usd";

#[derive(sqlx::FromRow)]
struct HoldingRow {
    id: i64,
    user_id: i64,
    crypto_id: i64,
    amount: Decimal,
    crypto_name: String,
    crypto_symbol: String,
    crypto_price_usd: Decimal,
}

impl From<HoldingRow> for HoldingWithCrypto {
    fn from(row: HoldingRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            crypto_id: row.crypto_id,
            amount: row.amount,
            crypto: CryptoCurrencyRecord {
                id: row.crypto_id,
                name: row.crypto_name,
                symbol: row.crypto_symbol,
                price_usd: row.crypto_price_usd,
            },
        }
    }
}

#[async_trait]
impl CryptoRepo for PostgresRepositories {
    async fn create_crypto(
        &self,
        params: CreateCryptoParams,
    ) -> Result<CryptoCurrencyRecord, RepoError> {
        let sql = format!(
            "INSERT INTO cryptocurrencies (name, symbol, price_usd) VALUES ($1, $2, $3) \
             RETURNING {CRYPTO_COLUMNS}"
        );
        sqlx::query_as::<_, CryptoCurrencyRecord>(&sql)
            .bind(params.name)
            .bind(params.symbol)
            .bind(params.price_usd)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_crypto_by_id(&self, id: i64) -> Result<Option<CryptoCurrencyRecord>, RepoError> {
        let sql = format!("SELECT {CRYPTO_COLUMNS} FROM cryptocurrencies WHERE id = $1");
        sqlx::query_as::<_, CryptoCurrencyRecord>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_crypto_conflict(
        &self,
        symbol: &str,
        name: &str,
    ) -> Result<Option<CryptoCurrencyRecord>, RepoError> {
        let sql = format!(
            "SELECT {CRYPTO_COLUMNS} FROM cryptocurrencies WHERE symbol = $1 OR name = $2 LIMIT 1"
        );
        sqlx::query_as::<_, CryptoCurrencyRecord>(&sql)
            .bind(symbol)
            .bind(name)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn find_crypto_by_symbol(
        &self,
        symbol: &str,
    ) -> Result<Option<CryptoCurrencyRecord>, RepoError> {
        let sql = format!("SELECT {CRYPTO_COLUMNS} FROM cryptocurrencies WHERE symbol = $1");
        sqlx::query_as::<_, CryptoCurrencyRecord>(&sql)
            .bind(symbol)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_cryptos(&self) -> Result<Vec<CryptoCurrencyRecord>, RepoError> {
        let sql = format!("SELECT {CRYPTO_COLUMNS} FROM cryptocurrencies ORDER BY symbol ASC");
        sqlx::query_as::<_, CryptoCurrencyRecord>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn update_crypto_price(
        &self,
        id: i64,
        price_usd: Decimal,
    ) -> Result<CryptoCurrencyRecord, RepoError> {
        let sql = format!(
            "UPDATE cryptocurrencies SET price_usd = $2 WHERE id = $1 RETURNING {CRYPTO_COLUMNS}"
        );
        sqlx::query_as::<_, CryptoCurrencyRecord>(&sql)
            .bind(id)
            .bind(price_usd)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)
    }

    async fn create_holding(
        &self,
        user_id: i64,
        crypto_id: i64,
        amount: Decimal,
    ) -> Result<HoldingRecord, RepoError> {
        sqlx::query_as::<_, HoldingRecord>(
            "INSERT INTO user_cryptos (user_id, crypto_id, amount) VALUES ($1, $2, $3) \
             RETURNING id, user_id, crypto_id, amount",
        )
        .bind(user_id)
        .bind(crypto_id)
        .bind(amount)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_holdings(&self, user_id: i64) -> Result<Vec<HoldingWithCrypto>, RepoError> {
        let rows = sqlx::query_as::<_, HoldingRow>(
            "SELECT uc.id, uc.user_id, uc.crypto_id, uc.amount, \
                    c.name AS crypto_name, c.symbol AS crypto_symbol, \
                    c.price_usd AS crypto_price_usd \
             FROM user_cryptos uc \
             INNER JOIN cryptocurrencies c ON c.id = uc.crypto_id \
             WHERE uc.user_id = $1 \
             ORDER BY uc.id ASC",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(HoldingWithCrypto::from).collect())
    }
}
