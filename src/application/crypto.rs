use std::sync::Arc;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::application::repos::{CreateCryptoParams, CryptoRepo, RepoError};
use crate::domain::entities::{CryptoCurrencyRecord, HoldingWithCrypto, UserRecord};
use crate::domain::error::DomainError;
use crate::domain::validation;

#[derive(Debug, Error)]
pub enum CryptoServiceError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("Crypto already exists")]
    AlreadyExists,
    #[error("Crypto not found")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct CreateCryptoCommand {
    pub name: String,
    pub symbol: String,
    pub price_usd: Option<Decimal>,
}

#[derive(Clone)]
pub struct CryptoService {
    repo: Arc<dyn CryptoRepo>,
}

impl CryptoService {
    pub fn new(repo: Arc<dyn CryptoRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(
        &self,
        command: CreateCryptoCommand,
    ) -> Result<CryptoCurrencyRecord, CryptoServiceError> {
        let name = command.name.trim().to_string();
        let symbol = normalize_symbol(&command.symbol);
        let price_usd = command.price_usd.unwrap_or(Decimal::ZERO);

        validation::non_empty("name", &name)?;
        validation::non_empty("symbol", &symbol)?;
        validation::non_negative_amount("price_usd", price_usd)?;

        if self.repo.find_crypto_conflict(&symbol, &name).await?.is_some() {
            return Err(CryptoServiceError::AlreadyExists);
        }

        self.repo
            .create_crypto(CreateCryptoParams {
                name,
                symbol,
                price_usd,
            })
            .await
            .map_err(|err| match err {
                RepoError::Duplicate { .. } => CryptoServiceError::AlreadyExists,
                other => CryptoServiceError::Repo(other),
            })
    }

    pub async fn list(&self) -> Result<Vec<CryptoCurrencyRecord>, CryptoServiceError> {
        self.repo.list_cryptos().await.map_err(CryptoServiceError::from)
    }

    pub async fn find(&self, symbol: &str) -> Result<CryptoCurrencyRecord, CryptoServiceError> {
        self.repo
            .find_crypto_by_symbol(&normalize_symbol(symbol))
            .await?
            .ok_or(CryptoServiceError::NotFound)
    }

    pub async fn update_price(
        &self,
        symbol: &str,
        price_usd: Decimal,
    ) -> Result<CryptoCurrencyRecord, CryptoServiceError> {
        validation::non_negative_amount("price_usd", price_usd)?;
        let crypto = self.find(symbol).await?;
        let updated = self.repo.update_crypto_price(crypto.id, price_usd).await?;
        tracing::info!(
            target = "coinpost::crypto",
            symbol = %updated.symbol,
            price_usd = %updated.price_usd,
            "crypto price updated"
        );
        Ok(updated)
    }

    pub async fn add_holding(
        &self,
        owner: &UserRecord,
        crypto_id: i64,
        amount: Decimal,
    ) -> Result<HoldingWithCrypto, CryptoServiceError> {
        validation::positive_amount("amount", amount)?;
        let crypto = self
            .repo
            .find_crypto_by_id(crypto_id)
            .await?
            .ok_or(CryptoServiceError::NotFound)?;

        let holding = self.repo.create_holding(owner.id, crypto.id, amount).await?;
        Ok(HoldingWithCrypto {
            id: holding.id,
            user_id: holding.user_id,
            crypto_id: holding.crypto_id,
            amount: holding.amount,
            crypto,
        })
    }

    pub async fn holdings(
        &self,
        owner: &UserRecord,
    ) -> Result<Vec<HoldingWithCrypto>, CryptoServiceError> {
        self.repo
            .list_holdings(owner.id)
            .await
            .map_err(CryptoServiceError::from)
    }
}

fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}
