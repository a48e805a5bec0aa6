pub mod coin_cap;
pub mod coin_gecko;
pub mod crypto_compare;
pub mod exchange_rate_api;
pub mod registry;
pub mod util;

use crate::core::config::{ProviderConfig, ProviderKind};
use crate::core::provider::RateSource;
use std::sync::Arc;

pub use registry::{Provider, ProviderRegistry};

/// Builds the adapter for a configured provider.
pub fn build_source(config: &ProviderConfig, client: reqwest::Client) -> Arc<dyn RateSource> {
    let base_url = config.base_url.as_deref();
    let credential = config.api_key.clone();
    match config.kind {
        ProviderKind::ExchangeRateApi => Arc::new(exchange_rate_api::ExchangeRateApiProvider::new(
            client, base_url, credential,
        )),
        ProviderKind::CoinGecko => Arc::new(coin_gecko::CoinGeckoProvider::new(
            client, base_url, credential,
        )),
        ProviderKind::CoinCap => Arc::new(coin_cap::CoinCapProvider::new(
            client, base_url, credential,
        )),
        ProviderKind::CryptoCompare => Arc::new(crypto_compare::CryptoCompareProvider::new(
            client, base_url, credential,
        )),
    }
}
