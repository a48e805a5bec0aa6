use super::util::{ensure_positive, get_json, ratio, unsupported};
use crate::core::asset::{AssetClass, classify, crypto_asset};
use crate::core::config::Credential;
use crate::core::error::ProviderError;
use crate::core::provider::RateSource;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com";

type SimplePriceResponse = HashMap<String, HashMap<String, Decimal>>;

pub struct CoinGeckoProvider {
    client: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

impl CoinGeckoProvider {
    pub fn new(client: reqwest::Client, base_url: Option<&str>, credential: Option<Credential>) -> Self {
        CoinGeckoProvider {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            credential,
        }
    }

    async fn simple_price(&self, ids: &[&str], vs_currency: &str) -> Result<SimplePriceResponse, ProviderError> {
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies={}",
            self.base_url,
            ids.join(","),
            vs_currency
        );
        debug!("Requesting simple price from {}", url);

        let mut request = self.client.get(&url);
        if let Some(key) = &self.credential {
            request = request.header("x-cg-demo-api-key", key.expose());
        }
        get_json(request).await
    }
}

fn price_of(data: &SimplePriceResponse, id: &str, vs_currency: &str) -> Result<Decimal, ProviderError> {
    data.get(id)
        .and_then(|prices| prices.get(vs_currency))
        .copied()
        .ok_or_else(|| ProviderError::MissingRate(format!("{id} in {vs_currency}")))
}

#[async_trait]
impl RateSource for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoFetch", skip(self))]
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, ProviderError> {
        match (classify(from), classify(to)) {
            (Some(AssetClass::Crypto), Some(AssetClass::Crypto)) => {
                let (Some(a), Some(b)) = (crypto_asset(from), crypto_asset(to)) else {
                    return Err(unsupported(from, to));
                };
                let data = self.simple_price(&[a.coingecko_id, b.coingecko_id], "usd").await?;
                ratio(
                    price_of(&data, a.coingecko_id, "usd")?,
                    price_of(&data, b.coingecko_id, "usd")?,
                )
            }
            (Some(AssetClass::Crypto), Some(AssetClass::Fiat)) => {
                let asset = crypto_asset(from).ok_or_else(|| unsupported(from, to))?;
                let vs = to.to_lowercase();
                let data = self.simple_price(&[asset.coingecko_id], &vs).await?;
                ensure_positive(price_of(&data, asset.coingecko_id, &vs)?)
            }
            (Some(AssetClass::Fiat), Some(AssetClass::Crypto)) => {
                let asset = crypto_asset(to).ok_or_else(|| unsupported(from, to))?;
                let vs = from.to_lowercase();
                let data = self.simple_price(&[asset.coingecko_id], &vs).await?;
                ratio(Decimal::ONE, price_of(&data, asset.coingecko_id, &vs)?)
            }
            _ => Err(unsupported(from, to)),
        }
    }
}
