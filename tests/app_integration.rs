use rust_decimal::Decimal;
use std::fs;
use std::str::FromStr;
use tempfile::TempDir;
use tracing::info;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xrate::AppCommand;
use xrate::config::AppConfig;
use xrate::core::{ConversionPath, ConversionRequest};

mod test_utils {
    use super::*;

    pub fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    /// ExchangeRate-API open endpoint serving the latest rates for `base`.
    pub async fn mount_latest_rates(server: &MockServer, base: &str, rates: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v6/latest/{base}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"result": "success", "base_code": "{base}", "rates": {rates}}}"#
            )))
            .mount(server)
            .await;
    }

    pub async fn mount_coin_gecko_price(server: &MockServer, id: &str, vs: &str, price: &str) {
        Mock::given(method("GET"))
            .and(path("/api/v3/simple/price"))
            .and(query_param("ids", id))
            .and(query_param("vs_currencies", vs))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!(r#"{{"{id}": {{"{vs}": {price}}}}}"#)),
            )
            .mount(server)
            .await;
    }

    pub async fn mount_coin_cap_price(server: &MockServer, id: &str, price_usd: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/v2/assets/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"data": {{"id": "{id}", "priceUsd": "{price_usd}"}}, "timestamp": 1}}"#
            )))
            .mount(server)
            .await;
    }

    pub async fn mount_failure(server: &MockServer) {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(server)
            .await;
    }

    /// Writes a config whose providers all point at local mock servers.
    pub fn write_config(dir: &TempDir, era: &MockServer, gecko: &MockServer, cap: &MockServer) -> String {
        write_config_with_persist(dir, era, gecko, cap, false)
    }

    pub fn write_config_with_persist(
        dir: &TempDir,
        era: &MockServer,
        gecko: &MockServer,
        cap: &MockServer,
        persist: bool,
    ) -> String {
        let config = format!(
            r#"
resolver:
  timeout_ms: 2000
  bridge_asset: USD
cache:
  ttl_secs: 600
  persist: {}
providers:
  - kind: exchange_rate_api
    priority: 0
    base_url: "{}"
  - kind: coin_gecko
    priority: 0
    base_url: "{}"
  - kind: coin_cap
    priority: 1
    base_url: "{}"
data_path: "{}"
"#,
            persist,
            era.uri(),
            gecko.uri(),
            cap.uri(),
            dir.path().join("data").display()
        );
        let config_path = dir.path().join("config.yaml");
        fs::write(&config_path, config).unwrap();
        config_path.to_string_lossy().to_string()
    }
}

use test_utils::*;

#[test_log::test(tokio::test)]
async fn test_convert_command_with_mock_providers() {
    let era = MockServer::start().await;
    let gecko = MockServer::start().await;
    let cap = MockServer::start().await;
    mount_latest_rates(&era, "USD", r#"{"USD": 1, "EUR": 0.92}"#).await;
    mount_failure(&gecko).await;
    mount_coin_cap_price(&cap, "bitcoin", "65000").await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &era, &gecko, &cap);

    let command = AppCommand::Convert {
        amount: dec("100"),
        from: "usd".to_string(),
        to: vec!["EUR".to_string(), "BTC".to_string()],
    };
    let result = xrate::run_command(command, Some(&config_path)).await;
    info!(?result, "Convert command finished");
    assert!(result.is_ok(), "Convert command failed: {result:?}");
}

#[test_log::test(tokio::test)]
async fn test_fiat_to_crypto_goes_through_bridge() {
    let era = MockServer::start().await;
    let gecko = MockServer::start().await;
    let cap = MockServer::start().await;
    mount_latest_rates(&era, "EUR", r#"{"EUR": 1, "USD": 1.08}"#).await;
    mount_coin_gecko_price(&gecko, "bitcoin", "usd", "65000").await;

    let dir = TempDir::new().unwrap();
    let config = AppConfig::load_from_path(write_config(&dir, &era, &gecko, &cap)).unwrap();
    let resolver = xrate::build_resolver(&config).unwrap();

    let request = ConversionRequest::new(dec("1000"), "EUR", "BTC").unwrap();
    let result = resolver.convert(request).await.unwrap();

    let expected_rate = dec("1.08") * (Decimal::ONE / dec("65000"));
    assert_eq!(result.quote.rate, expected_rate);
    assert_eq!(result.converted_amount, dec("1000") * expected_rate);
    assert_eq!(result.path(), &ConversionPath::Via("USD".to_string()));
    assert_eq!(
        result.quote.providers,
        vec!["ExchangeRate-API".to_string(), "CoinGecko".to_string()]
    );
    assert!(result.failures.is_empty());
    assert!(cap.received_requests().await.unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_failover_to_next_provider() {
    let era = MockServer::start().await;
    let gecko = MockServer::start().await;
    let cap = MockServer::start().await;
    mount_failure(&gecko).await;
    mount_coin_cap_price(&cap, "bitcoin", "65000").await;

    let dir = TempDir::new().unwrap();
    let config = AppConfig::load_from_path(write_config(&dir, &era, &gecko, &cap)).unwrap();
    let resolver = xrate::build_resolver(&config).unwrap();

    let request = ConversionRequest::new(dec("2"), "BTC", "USD").unwrap();
    let result = resolver.convert(request).await.unwrap();

    assert_eq!(result.converted_amount, dec("130000"));
    assert_eq!(result.quote.provider(), "CoinCap");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].provider, "CoinGecko");

    // Second lookup is served from the cache without touching any provider
    let gecko_calls = gecko.received_requests().await.unwrap().len();
    let cap_calls = cap.received_requests().await.unwrap().len();
    let request = ConversionRequest::new(dec("1"), "BTC", "USD").unwrap();
    let cached = resolver.convert(request).await.unwrap();
    assert!(cached.cached);
    assert!(cached.failures.is_empty());
    assert_eq!(cached.converted_amount, dec("65000"));
    assert_eq!(gecko.received_requests().await.unwrap().len(), gecko_calls);
    assert_eq!(cap.received_requests().await.unwrap().len(), cap_calls);
}

#[test_log::test(tokio::test)]
async fn test_all_providers_failing() {
    let era = MockServer::start().await;
    let gecko = MockServer::start().await;
    let cap = MockServer::start().await;
    mount_failure(&gecko).await;
    mount_failure(&cap).await;

    let dir = TempDir::new().unwrap();
    let config = AppConfig::load_from_path(write_config(&dir, &era, &gecko, &cap)).unwrap();
    let resolver = xrate::build_resolver(&config).unwrap();

    let request = ConversionRequest::new(dec("1"), "ETH", "USD").unwrap();
    let error = resolver.convert(request).await.unwrap_err();
    assert!(!error.is_invalid_input());
    let providers: Vec<&str> = error.attempts().iter().map(|a| a.provider.as_str()).collect();
    assert_eq!(providers, vec!["CoinGecko", "CoinCap"]);

    let command = AppCommand::Convert {
        amount: dec("1"),
        from: "ETH".to_string(),
        to: vec!["USD".to_string()],
    };
    let config_path = dir.path().join("config.yaml");
    let result = xrate::run_command(command, config_path.to_str()).await;
    assert!(result.unwrap_err().to_string().contains("1 of 1 conversions failed"));
}

#[test_log::test(tokio::test)]
async fn test_invalid_asset_contacts_no_provider() {
    let era = MockServer::start().await;
    let gecko = MockServer::start().await;
    let cap = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &era, &gecko, &cap);

    let command = AppCommand::Convert {
        amount: dec("1"),
        from: "XYZ".to_string(),
        to: vec!["USD".to_string()],
    };
    let result = xrate::run_command(command, Some(&config_path)).await;
    assert!(result.is_err());

    for server in [&era, &gecko, &cap] {
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

#[test_log::test(tokio::test)]
async fn test_listing_commands() {
    let era = MockServer::start().await;
    let gecko = MockServer::start().await;
    let cap = MockServer::start().await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config(&dir, &era, &gecko, &cap);

    assert!(
        xrate::run_command(AppCommand::Providers, Some(&config_path))
            .await
            .is_ok()
    );
    assert!(
        xrate::run_command(AppCommand::Assets, Some(&config_path))
            .await
            .is_ok()
    );
}

#[test_log::test(tokio::test)]
async fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("config.yaml");
    fs::write(&config_path, "resolver:\n  bridge_asset: BTC\n").unwrap();

    let result = xrate::run_command(AppCommand::Assets, config_path.to_str()).await;
    assert!(result.is_err());
}

#[test_log::test(tokio::test)]
async fn test_persistent_cache_is_shared_across_runs() {
    let era = MockServer::start().await;
    let gecko = MockServer::start().await;
    let cap = MockServer::start().await;
    mount_latest_rates(&era, "USD", r#"{"USD": 1, "EUR": 0.92}"#).await;

    let dir = TempDir::new().unwrap();
    let config_path = write_config_with_persist(&dir, &era, &gecko, &cap, true);
    let config = AppConfig::load_from_path(&config_path).unwrap();
    assert!(config.cache.persist);

    {
        let resolver = xrate::build_resolver(&config).unwrap();
        let request = ConversionRequest::new(dec("100"), "USD", "EUR").unwrap();
        let result = resolver.convert(request).await.unwrap();
        assert!(!result.cached);
        assert_eq!(result.converted_amount, dec("92.00"));
    }
    assert_eq!(era.received_requests().await.unwrap().len(), 1);
    assert!(dir.path().join("data").join("cache").is_dir());

    // A fresh resolver, as on the next invocation, reads the rate from disk
    let resolver = xrate::build_resolver(&config).unwrap();
    let request = ConversionRequest::new(dec("10"), "USD", "EUR").unwrap();
    let result = resolver.convert(request).await.unwrap();
    assert!(result.cached);
    assert_eq!(result.quote.provider(), "ExchangeRate-API");
    assert_eq!(result.converted_amount, dec("9.20"));
    assert_eq!(era.received_requests().await.unwrap().len(), 1);

    // The inverse was written alongside
    let inverse = resolver.resolve("EUR", "USD").await.unwrap();
    assert!(inverse.cached);
}
