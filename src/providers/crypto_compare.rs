use super::util::{ensure_positive, get_json};
use crate::core::config::Credential;
use crate::core::error::ProviderError;
use crate::core::provider::RateSource;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://min-api.cryptocompare.com";

/// CryptoCompare quotes any fiat or crypto pair directly.
pub struct CryptoCompareProvider {
    client: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PriceResponse {
    Error {
        #[serde(rename = "Response")]
        response: String,
        #[serde(rename = "Message")]
        message: String,
    },
    Prices(HashMap<String, Decimal>),
}

impl CryptoCompareProvider {
    pub fn new(client: reqwest::Client, base_url: Option<&str>, credential: Option<Credential>) -> Self {
        CryptoCompareProvider {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            credential,
        }
    }
}

#[async_trait]
impl RateSource for CryptoCompareProvider {
    #[instrument(name = "CryptoCompareFetch", skip(self))]
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, ProviderError> {
        let url = format!("{}/data/price?fsym={from}&tsyms={to}", self.base_url);
        debug!("Requesting price from {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.credential {
            request = request.header("authorization", format!("Apikey {}", key.expose()));
        }

        match get_json::<PriceResponse>(request).await? {
            PriceResponse::Error { response, message } => Err(ProviderError::Malformed(format!(
                "{response}: {message}"
            ))),
            PriceResponse::Prices(prices) => {
                let rate = prices
                    .get(to)
                    .copied()
                    .ok_or_else(|| ProviderError::MissingRate(to.to_string()))?;
                ensure_positive(rate)
            }
        }
    }
}
