use crate::core::cache::{RateCache, cache_key};
use crate::core::quote::RateQuote;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

const PARTITION_NAME: &str = "rates";

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    quote: RateQuote,
    expires_at: DateTime<Utc>,
}

/// Rate cache persisted in a fjall keyspace so quotes survive restarts.
/// Storage failures are logged and read as misses.
pub struct DiskRateCache {
    keyspace: Keyspace,
    partition: PartitionHandle,
    ttl: chrono::Duration,
}

impl DiskRateCache {
    pub fn open(path: &Path, ttl: Duration) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create cache directory: {}", path.display()))?;

        let keyspace = Config::new(path)
            .open()
            .with_context(|| format!("Failed to open cache at {}", path.display()))?;
        let partition = keyspace
            .open_partition(PARTITION_NAME, PartitionCreateOptions::default())
            .context("Failed to open rates partition")?;

        Ok(Self {
            keyspace,
            partition,
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX),
        })
    }

    fn read(&self, key: &str) -> Result<Option<RateQuote>> {
        let Some(value) = self.partition.get(key.as_bytes())? else {
            debug!("Cache MISS for key: {}", key);
            return Ok(None);
        };
        let entry: CacheEntry = serde_json::from_slice(&value)?;
        if entry.expires_at <= Utc::now() {
            debug!("Cache entry expired for key: {}", key);
            self.partition.remove(key.as_bytes())?;
            return Ok(None);
        }
        debug!("Cache HIT for key: {}", key);
        Ok(Some(entry.quote))
    }

    fn write(&self, quote: RateQuote) -> Result<()> {
        let key = cache_key(&quote.source_asset, &quote.target_asset);
        let expires_at = Utc::now()
            .checked_add_signed(self.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let entry = CacheEntry { quote, expires_at };
        self.partition
            .insert(key.as_bytes(), serde_json::to_vec(&entry)?)?;
        self.keyspace.persist(PersistMode::SyncData)?;
        debug!("Cache PUT for key: {}", key);
        Ok(())
    }

    fn remove_all(&self) -> Result<()> {
        let keys = self
            .partition
            .keys()
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for key in keys {
            self.partition.remove(key)?;
        }
        Ok(())
    }
}

#[async_trait]
impl RateCache for DiskRateCache {
    async fn get(&self, source: &str, target: &str) -> Option<RateQuote> {
        match self.read(&cache_key(source, target)) {
            Ok(val) => val,
            Err(e) => {
                debug!("DiskRateCache get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, quote: RateQuote) {
        if let Err(e) = self.write(quote) {
            debug!("DiskRateCache put error: {}", e);
        }
    }

    async fn clear(&self) {
        if let Err(e) = self.remove_all() {
            debug!("DiskRateCache clear error: {}", e);
        }
    }
}
