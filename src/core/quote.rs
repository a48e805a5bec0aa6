//! Conversion requests, rate quotes and results

use crate::core::asset::{AssetClass, classify, normalize_symbol};
use crate::core::error::{FailedAttempt, InvalidRequest, ProviderError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Provider name recorded on quotes that never touched the network.
pub const IDENTITY_PROVIDER: &str = "identity";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source_asset: String,
    pub target_asset: String,
    pub amount: Decimal,
}

impl ConversionRequest {
    /// Validates and normalizes a request. Symbols are uppercased and must
    /// be present in the classification table.
    pub fn new(amount: Decimal, source: &str, target: &str) -> Result<Self, InvalidRequest> {
        if amount <= Decimal::ZERO {
            return Err(InvalidRequest::NonPositiveAmount(amount));
        }
        let (source_asset, _) = validate_asset(source)?;
        let (target_asset, _) = validate_asset(target)?;
        Ok(Self {
            source_asset,
            target_asset,
            amount,
        })
    }
}

/// Normalizes a symbol and returns it with its class.
pub fn validate_asset(symbol: &str) -> Result<(String, AssetClass), InvalidRequest> {
    let symbol = normalize_symbol(symbol);
    if symbol.is_empty() {
        return Err(InvalidRequest::EmptyAsset);
    }
    match classify(&symbol) {
        Some(class) => Ok((symbol, class)),
        None => Err(InvalidRequest::UnknownAsset(symbol)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionPath {
    Identity,
    Direct,
    Via(String),
}

impl Display for ConversionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConversionPath::Identity => write!(f, "identity"),
            ConversionPath::Direct => write!(f, "direct"),
            ConversionPath::Via(asset) => write!(f, "via {asset}"),
        }
    }
}

/// A rate snapshot. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    pub source_asset: String,
    pub target_asset: String,
    /// Units of target per unit of source.
    pub rate: Decimal,
    /// Providers that produced the rate, in hop order.
    pub providers: Vec<String>,
    pub fetched_at: DateTime<Utc>,
    pub path: ConversionPath,
}

impl RateQuote {
    pub fn direct(source: &str, target: &str, rate: Decimal, provider: &str) -> Self {
        Self {
            source_asset: source.to_string(),
            target_asset: target.to_string(),
            rate,
            providers: vec![provider.to_string()],
            fetched_at: Utc::now(),
            path: ConversionPath::Direct,
        }
    }

    pub fn identity(asset: &str) -> Self {
        Self {
            source_asset: asset.to_string(),
            target_asset: asset.to_string(),
            rate: Decimal::ONE,
            providers: vec![IDENTITY_PROVIDER.to_string()],
            fetched_at: Utc::now(),
            path: ConversionPath::Identity,
        }
    }

    /// Chains `first` (A->B) with `second` (B->C) into an A->C quote. The
    /// older of the two timestamps is kept. Fails when the product overflows
    /// or rounds down to zero.
    pub fn compose(first: &RateQuote, second: &RateQuote) -> Result<Self, ProviderError> {
        let rate = first
            .rate
            .checked_mul(second.rate)
            .ok_or(ProviderError::RateOverflow(first.rate, second.rate))?;
        if rate <= Decimal::ZERO {
            return Err(ProviderError::InvalidRate(rate));
        }

        let mut providers = first.providers.clone();
        providers.extend(second.providers.iter().cloned());
        Ok(Self {
            source_asset: first.source_asset.clone(),
            target_asset: second.target_asset.clone(),
            rate,
            providers,
            fetched_at: first.fetched_at.min(second.fetched_at),
            path: ConversionPath::Via(first.target_asset.clone()),
        })
    }

    /// The target->source quote, `None` if the rate cannot be inverted.
    pub fn inverse(&self) -> Option<Self> {
        let rate = Decimal::ONE.checked_div(self.rate)?;
        Some(Self {
            source_asset: self.target_asset.clone(),
            target_asset: self.source_asset.clone(),
            rate,
            providers: self.providers.iter().rev().cloned().collect(),
            fetched_at: self.fetched_at,
            path: self.path.clone(),
        })
    }

    /// Display form of the provenance, e.g. `ExchangeRate-API + CoinGecko`.
    pub fn provider(&self) -> String {
        self.providers.join(" + ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub request: ConversionRequest,
    pub quote: RateQuote,
    pub converted_amount: Decimal,
    /// Provider attempts that failed before the quote was obtained.
    pub failures: Vec<FailedAttempt>,
    pub cached: bool,
}

impl ConversionResult {
    pub fn path(&self) -> &ConversionPath {
        &self.quote.path
    }
}
