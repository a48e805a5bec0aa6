use crate::core::error::ProviderError;
use anyhow::Result;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};

/// Builds the HTTP client shared by all adapters. `timeout` bounds both
/// connecting and the whole request.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("xrate/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(timeout)
        .timeout(timeout)
        .build()?;
    Ok(client)
}

/// Sends `request` and parses a JSON body. Non-2xx responses and bodies that
/// do not match `T` are provider failures.
pub async fn get_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await?;
    let status = response.status();
    debug!(%status, url = %response.url(), "Received provider response");

    if !status.is_success() {
        return Err(ProviderError::Status(status.to_string()));
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
        error!(error = ?e, response = %text, "Failed to parse provider response");
        ProviderError::from(e)
    })
}

pub fn ensure_positive(rate: Decimal) -> Result<Decimal, ProviderError> {
    if rate > Decimal::ZERO {
        Ok(rate)
    } else {
        Err(ProviderError::InvalidRate(rate))
    }
}

/// `numerator / denominator` for two prices quoted in the same currency.
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Result<Decimal, ProviderError> {
    let numerator = ensure_positive(numerator)?;
    let denominator = ensure_positive(denominator)?;
    numerator
        .checked_div(denominator)
        .ok_or(ProviderError::InvalidRate(denominator))
}

pub fn unsupported(from: &str, to: &str) -> ProviderError {
    ProviderError::UnsupportedPair {
        from: from.to_string(),
        to: to.to_string(),
    }
}
