pub mod disk;
pub mod memory;

use crate::core::cache::RateCache;
use crate::core::config::CacheConfig;
use disk::DiskRateCache;
use memory::MemoryRateCache;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the configured cache. A persistent cache that cannot be opened
/// falls back to memory so conversions keep working.
pub fn open_cache(config: &CacheConfig, data_path: Option<&Path>) -> Arc<dyn RateCache> {
    let ttl = config.ttl();
    if config.persist {
        if let Some(path) = data_path {
            let cache_dir = path.join("cache");
            match DiskRateCache::open(&cache_dir, ttl) {
                Ok(cache) => {
                    debug!("Using disk cache at {}", cache_dir.display());
                    return Arc::new(cache);
                }
                Err(e) => warn!(error = %e, "Failed to open disk cache, using memory"),
            }
        } else {
            warn!("No data path available for disk cache, using memory");
        }
    }
    Arc::new(MemoryRateCache::new(ttl))
}
