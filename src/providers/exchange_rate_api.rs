use super::util::{ensure_positive, get_json, unsupported};
use crate::core::asset::{AssetClass, classify};
use crate::core::config::Credential;
use crate::core::error::ProviderError;
use crate::core::provider::RateSource;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

pub const OPEN_BASE_URL: &str = "https://open.er-api.com";
pub const KEYED_BASE_URL: &str = "https://v6.exchangerate-api.com";

/// Fiat rates from ExchangeRate-API. Without a credential the open endpoint
/// is used, which is rate limited but needs no key.
pub struct ExchangeRateApiProvider {
    client: reqwest::Client,
    base_url: String,
    credential: Option<Credential>,
}

impl ExchangeRateApiProvider {
    pub fn new(client: reqwest::Client, base_url: Option<&str>, credential: Option<Credential>) -> Self {
        let default_url = if credential.is_some() {
            KEYED_BASE_URL
        } else {
            OPEN_BASE_URL
        };
        ExchangeRateApiProvider {
            client,
            base_url: base_url.unwrap_or(default_url).trim_end_matches('/').to_string(),
            credential,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExchangeRateResponse {
    result: Option<String>,
    #[serde(rename = "error-type")]
    error_type: Option<String>,
    rates: Option<HashMap<String, Decimal>>,
    conversion_rate: Option<Decimal>,
}

impl ExchangeRateResponse {
    fn check_result(&self) -> Result<(), ProviderError> {
        if self.result.as_deref() == Some("error") {
            return Err(ProviderError::Malformed(format!(
                "API error: {}",
                self.error_type.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiProvider {
    #[instrument(name = "ExchangeRateApiFetch", skip(self))]
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<Decimal, ProviderError> {
        if classify(from) != Some(AssetClass::Fiat) || classify(to) != Some(AssetClass::Fiat) {
            return Err(unsupported(from, to));
        }

        let rate = match &self.credential {
            Some(key) => {
                let url = format!("{}/v6/{}/pair/{from}/{to}", self.base_url, key.expose());
                debug!("Requesting pair rate from {}/v6/***/pair/{from}/{to}", self.base_url);
                let data: ExchangeRateResponse = get_json(self.client.get(&url)).await?;
                data.check_result()?;
                data.conversion_rate
                    .ok_or_else(|| ProviderError::MissingRate("conversion_rate".to_string()))?
            }
            None => {
                let url = format!("{}/v6/latest/{from}", self.base_url);
                debug!("Requesting latest rates from {}", url);
                let data: ExchangeRateResponse = get_json(self.client.get(&url)).await?;
                data.check_result()?;
                data.rates
                    .and_then(|rates| rates.get(to).copied())
                    .ok_or_else(|| ProviderError::MissingRate(to.to_string()))?
            }
        };

        ensure_positive(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> reqwest::Client {
        crate::providers::util::build_client(Duration::from_secs(5)).unwrap()
    }

    async fn mount(server: &MockServer, request_path: &str, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_open_endpoint_rate() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/v6/latest/USD",
            200,
            r#"{"result": "success", "base_code": "USD", "rates": {"USD": 1, "EUR": 0.92, "INR": 83.12}}"#,
        )
        .await;

        let provider = ExchangeRateApiProvider::new(client(), Some(&mock_server.uri()), None);
        let rate = provider.fetch_rate("USD", "EUR").await.unwrap();
        assert_eq!(rate, Decimal::from_str("0.92").unwrap());
    }

    #[tokio::test]
    async fn test_keyed_endpoint_rate() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/v6/my-key/pair/EUR/GBP",
            200,
            r#"{"result": "success", "conversion_rate": 0.8412}"#,
        )
        .await;

        let provider = ExchangeRateApiProvider::new(
            client(),
            Some(&mock_server.uri()),
            Some(Credential::new("my-key")),
        );
        let rate = provider.fetch_rate("EUR", "GBP").await.unwrap();
        assert_eq!(rate, Decimal::from_str("0.8412").unwrap());
    }

    #[tokio::test]
    async fn test_missing_target_rate() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/v6/latest/USD",
            200,
            r#"{"result": "success", "rates": {"EUR": 0.92}}"#,
        )
        .await;

        let provider = ExchangeRateApiProvider::new(client(), Some(&mock_server.uri()), None);
        let result = provider.fetch_rate("USD", "PKR").await;
        assert_eq!(result, Err(ProviderError::MissingRate("PKR".to_string())));
    }

    #[tokio::test]
    async fn test_error_result_body() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/v6/bad-key/pair/USD/EUR",
            200,
            r#"{"result": "error", "error-type": "invalid-key"}"#,
        )
        .await;

        let provider = ExchangeRateApiProvider::new(
            client(),
            Some(&mock_server.uri()),
            Some(Credential::new("bad-key")),
        );
        let result = provider.fetch_rate("USD", "EUR").await;
        assert_eq!(
            result,
            Err(ProviderError::Malformed("API error: invalid-key".to_string()))
        );
    }

    #[tokio::test]
    async fn test_http_error_response() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, "/v6/latest/USD", 500, "").await;

        let provider = ExchangeRateApiProvider::new(client(), Some(&mock_server.uri()), None);
        let result = provider.fetch_rate("USD", "EUR").await;
        assert_eq!(
            result,
            Err(ProviderError::Status("500 Internal Server Error".to_string()))
        );
    }

    #[tokio::test]
    async fn test_crypto_pair_is_unsupported() {
        let provider = ExchangeRateApiProvider::new(client(), Some("http://localhost:1"), None);
        let result = provider.fetch_rate("BTC", "USD").await;
        assert!(matches!(result, Err(ProviderError::UnsupportedPair { .. })));
    }
}
