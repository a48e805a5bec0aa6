use super::util::{ensure_positive, get_json, ratio, unsupported};
use crate::core::asset::crypto_asset;
use crate::core::config::Credential;
use crate::core::error::ProviderError;
use crate::core::provider::RateSource;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.coincap.io";

/// CoinCap only quotes assets in USD, so fiat sides other than USD are
/// unsupported.
pub struct CoinCapProvider {
    client: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

#[derive(Debug, Deserialize)]
struct AssetResponse {
    data: AssetData,
}

#[derive(Debug, Deserialize)]
struct AssetData {
    #[serde(alias = "priceUsd")]
    price_usd: Option<Decimal>,
}

impl CoinCapProvider {
    pub fn new(client: reqwest::Client, base_url: Option<&str>, credential: Option<Credential>) -> Self {
        CoinCapProvider {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            credential,
        }
    }

    async fn price_usd(&self, coincap_id: &str) -> Result<Decimal, ProviderError> {
        let url = format!("{}/v2/assets/{}", self.base_url, coincap_id);
        debug!("Requesting asset price from {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.credential {
            request = request.bearer_auth(key.expose());
        }
        let data: AssetResponse = get_json(request).await?;
        data.data
            .price_usd
            .ok_or_else(|| ProviderError::MissingRate(format!("priceUsd for {coincap_id}")))
    }
}

#[async_trait]
impl RateSource for CoinCapProvider {
    #[instrument(name = "CoinCapFetch", skip(self))]
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, ProviderError> {
        match (crypto_asset(from), crypto_asset(to)) {
            (Some(a), Some(b)) => {
                let price_a = self.price_usd(a.coincap_id).await?;
                let price_b = self.price_usd(b.coincap_id).await?;
                ratio(price_a, price_b)
            }
            (Some(a), None) if to == "USD" => ensure_positive(self.price_usd(a.coincap_id).await?),
            (None, Some(b)) if from == "USD" => ratio(Decimal::ONE, self.price_usd(b.coincap_id).await?),
            _ => Err(unsupported(from, to)),
        }
    }
}
