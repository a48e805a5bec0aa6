//! Error taxonomy for rate resolution

use crate::core::asset::AssetClass;
use rust_decimal::Decimal;
use std::fmt::Display;
use thiserror::Error;

/// Rejected before any provider is contacted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRequest {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),
    #[error("asset symbol must not be empty")]
    EmptyAsset,
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
    #[error("amount {0} is too large to convert")]
    AmountOverflow(Decimal),
}

/// Why a single provider attempt failed. Never surfaced on its own, only
/// as part of a [`FailedAttempt`] list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP error: {0}")]
    Status(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("rate for {0} missing from response")]
    MissingRate(String),
    #[error("non-positive rate: {0}")]
    InvalidRate(Decimal),
    #[error("rate {0} x {1} is out of range")]
    RateOverflow(Decimal, Decimal),
    #[error("pair {from}/{to} is not supported")]
    UnsupportedPair { from: String, to: String },
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else if e.is_decode() {
            ProviderError::Malformed(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        ProviderError::Malformed(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedAttempt {
    pub provider: String,
    pub error: ProviderError,
}

impl Display for FailedAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    First,
    Second,
}

impl Display for Hop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hop::First => write!(f, "first hop"),
            Hop::Second => write!(f, "second hop"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("invalid request: {0}")]
    Invalid(#[from] InvalidRequest),

    #[error("all {class} providers failed for {from}/{to}: [{}]", join_attempts(.attempts))]
    AllProvidersExhausted {
        from: String,
        to: String,
        class: AssetClass,
        attempts: Vec<FailedAttempt>,
    },

    #[error("{hop} of {from}/{to} via {via} failed: {inner}")]
    Composition {
        hop: Hop,
        from: String,
        to: String,
        via: String,
        #[source]
        inner: Box<ConvertError>,
    },

    /// A hop answered, but its rate cannot be chained with the other hop.
    #[error("rate for {from}/{to} rejected: {attempt}")]
    RateRejected {
        from: String,
        to: String,
        attempt: FailedAttempt,
    },
}

impl ConvertError {
    /// True when the caller supplied bad input, as opposed to every data
    /// source being unavailable.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, ConvertError::Invalid(_))
    }

    /// Every provider attempt that failed on the way to this error.
    pub fn attempts(&self) -> &[FailedAttempt] {
        match self {
            ConvertError::Invalid(_) => &[],
            ConvertError::AllProvidersExhausted { attempts, .. } => attempts,
            ConvertError::Composition { inner, .. } => inner.attempts(),
            ConvertError::RateRejected { attempt, .. } => std::slice::from_ref(attempt),
        }
    }
}

fn join_attempts(attempts: &[FailedAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exhausted_message_lists_attempts() {
        let err = ConvertError::AllProvidersExhausted {
            from: "USD".to_string(),
            to: "EUR".to_string(),
            class: AssetClass::Fiat,
            attempts: vec![
                FailedAttempt {
                    provider: "A".to_string(),
                    error: ProviderError::Timeout,
                },
                FailedAttempt {
                    provider: "B".to_string(),
                    error: ProviderError::Status("503 Service Unavailable".to_string()),
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "all fiat providers failed for USD/EUR: [A: request timed out; B: HTTP error: 503 Service Unavailable]"
        );
        assert!(!err.is_invalid_input());
        assert_eq!(err.attempts().len(), 2);
    }

    #[test]
    fn test_composition_exposes_inner_attempts() {
        let inner = ConvertError::AllProvidersExhausted {
            from: "USD".to_string(),
            to: "BTC".to_string(),
            class: AssetClass::Crypto,
            attempts: vec![FailedAttempt {
                provider: "CoinGecko".to_string(),
                error: ProviderError::MissingRate("usd".to_string()),
            }],
        };
        let err = ConvertError::Composition {
            hop: Hop::Second,
            from: "EUR".to_string(),
            to: "BTC".to_string(),
            via: "USD".to_string(),
            inner: Box::new(inner),
        };
        assert!(err.to_string().starts_with("second hop of EUR/BTC via USD failed"));
        assert_eq!(err.attempts()[0].provider, "CoinGecko");
    }

    #[test]
    fn test_rejected_rate_is_a_provider_failure() {
        let err = ConvertError::RateRejected {
            from: "USD".to_string(),
            to: "BTC".to_string(),
            attempt: FailedAttempt {
                provider: "CoinGecko".to_string(),
                error: ProviderError::InvalidRate(Decimal::ZERO),
            },
        };
        assert!(!err.is_invalid_input());
        assert_eq!(err.attempts().len(), 1);
        assert_eq!(
            err.to_string(),
            "rate for USD/BTC rejected: CoinGecko: non-positive rate: 0"
        );
    }

    #[test]
    fn test_invalid_request_is_input_error() {
        let err: ConvertError = InvalidRequest::UnknownAsset("XYZ".to_string()).into();
        assert!(err.is_invalid_input());
        assert!(err.attempts().is_empty());
        assert_eq!(err.to_string(), "invalid request: unknown asset: XYZ");
    }
}
