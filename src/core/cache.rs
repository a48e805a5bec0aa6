//! Rate cache abstraction

use crate::core::quote::RateQuote;
use async_trait::async_trait;

/// Keyed store of recent quotes. Entries expire a fixed TTL after they were
/// written; expired entries read as absent.
#[async_trait]
pub trait RateCache: Send + Sync {
    async fn get(&self, source: &str, target: &str) -> Option<RateQuote>;

    /// Overwrites any entry for the quote's pair.
    async fn put(&self, quote: RateQuote);

    async fn clear(&self);
}

pub(crate) fn cache_key(source: &str, target: &str) -> String {
    format!("{source}/{target}")
}
