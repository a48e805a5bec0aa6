use crate::core::cache::RateCache;
use crate::core::quote::RateQuote;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    quote: RateQuote,
    expires_at: DateTime<Utc>,
}

impl CacheValue {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory rate cache using a HashMap behind a Mutex
pub struct MemoryRateCache {
    inner: Mutex<HashMap<(String, String), CacheValue>>,
    ttl: chrono::Duration,
}

impl MemoryRateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        }
    }

    /// Drops every expired entry and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut cache = self.inner.lock().await;
        let before = cache.len();
        cache.retain(|_, entry| !entry.is_expired(now));
        let purged = before - cache.len();
        debug!("Cache PURGE removed {} entries", purged);
        purged
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl RateCache for MemoryRateCache {
    async fn get(&self, source: &str, target: &str) -> Option<RateQuote> {
        let cache = self.inner.lock().await;
        let key = (source.to_string(), target.to_string());
        if let Some(entry) = cache.get(&key) {
            if entry.is_expired(Utc::now()) {
                debug!("Cache entry expired for key: {}/{}", source, target);
                return None;
            }
            debug!("Cache HIT for key: {}/{}", source, target);
            return Some(entry.quote.clone());
        }
        debug!("Cache MISS for key: {}/{}", source, target);
        None
    }

    async fn put(&self, quote: RateQuote) {
        let key = (quote.source_asset.clone(), quote.target_asset.clone());
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}/{}", key.0, key.1);
        cache.insert(key, CacheValue { quote, expires_at });
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}
