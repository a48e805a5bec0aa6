//! Asset symbols and their classification

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Fiat,
    Crypto,
}

impl Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                AssetClass::Fiat => "fiat",
                AssetClass::Crypto => "crypto",
            }
        )
    }
}

impl FromStr for AssetClass {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fiat" => Ok(AssetClass::Fiat),
            "crypto" => Ok(AssetClass::Crypto),
            _ => Err(anyhow::anyhow!("Invalid asset class: {}", s)),
        }
    }
}

/// A supported cryptocurrency and the identifiers providers know it by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CryptoAsset {
    pub symbol: &'static str,
    pub coingecko_id: &'static str,
    pub coincap_id: &'static str,
}

pub const FIAT_CURRENCIES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "AUD", "CAD", "CHF", "CNY", "HKD", "NZD", "SEK", "KRW", "SGD",
    "NOK", "MXN", "INR", "RUB", "ZAR", "TRY", "BRL", "TWD", "DKK", "PLN", "THB", "IDR", "HUF",
    "CZK", "ILS", "CLP", "PHP", "AED", "SAR", "MYR", "PKR",
];

pub const CRYPTO_ASSETS: &[CryptoAsset] = &[
    CryptoAsset { symbol: "BTC", coingecko_id: "bitcoin", coincap_id: "bitcoin" },
    CryptoAsset { symbol: "ETH", coingecko_id: "ethereum", coincap_id: "ethereum" },
    CryptoAsset { symbol: "USDT", coingecko_id: "tether", coincap_id: "tether" },
    CryptoAsset { symbol: "BNB", coingecko_id: "binancecoin", coincap_id: "binance-coin" },
    CryptoAsset { symbol: "USDC", coingecko_id: "usd-coin", coincap_id: "usd-coin" },
    CryptoAsset { symbol: "XRP", coingecko_id: "ripple", coincap_id: "xrp" },
    CryptoAsset { symbol: "SOL", coingecko_id: "solana", coincap_id: "solana" },
    CryptoAsset { symbol: "ADA", coingecko_id: "cardano", coincap_id: "cardano" },
    CryptoAsset { symbol: "DOGE", coingecko_id: "dogecoin", coincap_id: "dogecoin" },
    CryptoAsset { symbol: "DOT", coingecko_id: "polkadot", coincap_id: "polkadot" },
    CryptoAsset { symbol: "DAI", coingecko_id: "dai", coincap_id: "multi-collateral-dai" },
    CryptoAsset { symbol: "BUSD", coingecko_id: "binance-usd", coincap_id: "binance-usd" },
];

/// Trims and uppercases a user supplied symbol.
pub fn normalize_symbol(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// Looks up the class of an already normalized symbol.
pub fn classify(symbol: &str) -> Option<AssetClass> {
    if FIAT_CURRENCIES.contains(&symbol) {
        Some(AssetClass::Fiat)
    } else if crypto_asset(symbol).is_some() {
        Some(AssetClass::Crypto)
    } else {
        None
    }
}

pub fn crypto_asset(symbol: &str) -> Option<&'static CryptoAsset> {
    CRYPTO_ASSETS.iter().find(|asset| asset.symbol == symbol)
}
