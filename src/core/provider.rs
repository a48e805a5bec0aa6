//! Uniform capability implemented by every rate data source

use crate::core::error::ProviderError;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Units of `to` per unit of `from`. Symbols arrive normalized.
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, ProviderError>;
}
