//! Read-through caches over the creative store
//!
//! Two cache points exist: the active-country allow-list (long TTL, with an
//! explicit invalidation hook for data changes) and the per-network and
//! per-format counts (short TTL, fixed key). Concurrent misses for one key
//! collapse to a single store call via `try_get_with`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::{EngineError, Result};
use crate::store::CreativeStore;
use crate::types::AdFormat;

const COUNTRIES_KEY: &str = "countries";
const NETWORK_COUNTS_KEY: &str = "network_counts";
const FORMAT_COUNTS_KEY: &str = "format_counts";

/// Cached allow-list of countries with active inventory
pub struct CountryAllowList {
    store: Arc<dyn CreativeStore>,
    cache: Cache<&'static str, Arc<HashSet<String>>>,
}

impl CountryAllowList {
    pub fn new(store: Arc<dyn CreativeStore>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.country_ttl_secs))
            .build();
        Self { store, cache }
    }

    /// Current allow-list, upper-case ISO-2 codes
    pub async fn snapshot(&self) -> Result<HashSet<String>> {
        let store = Arc::clone(&self.store);
        let entry = self
            .cache
            .try_get_with(COUNTRIES_KEY, async move {
                debug!("refreshing country allow-list");
                let codes = store.active_countries().await?;
                Ok::<_, EngineError>(Arc::new(
                    codes.into_iter().map(|c| c.to_uppercase()).collect(),
                ))
            })
            .await
            .map_err(|e: Arc<EngineError>| EngineError::store(e.to_string()))?;
        Ok(entry.as_ref().clone())
    }

    /// Drop the cached list so the next read recomputes it
    pub async fn invalidate(&self) {
        self.cache.invalidate(&COUNTRIES_KEY).await;
    }
}

/// Cached ready-creative counts per network, back-filled so every known
/// network appears even with zero inventory
pub struct NetworkCountCache {
    store: Arc<dyn CreativeStore>,
    cache: Cache<&'static str, Arc<HashMap<String, u64>>>,
}

impl NetworkCountCache {
    pub fn new(store: Arc<dyn CreativeStore>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.network_counts_ttl_secs))
            .build();
        Self { store, cache }
    }

    pub async fn counts(&self) -> Result<HashMap<String, u64>> {
        let store = Arc::clone(&self.store);
        let entry = self
            .cache
            .try_get_with(NETWORK_COUNTS_KEY, async move {
                debug!("refreshing network counts");
                let observed = store.network_counts().await?;
                let mut counts: HashMap<String, u64> = store
                    .network_names()
                    .await?
                    .into_iter()
                    .map(|name| (name, 0))
                    .collect();
                for (name, count) in observed {
                    counts.insert(name, count);
                }
                Ok::<_, EngineError>(Arc::new(counts))
            })
            .await
            .map_err(|e: Arc<EngineError>| EngineError::store(e.to_string()))?;
        Ok(entry.as_ref().clone())
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&NETWORK_COUNTS_KEY).await;
    }
}

/// Cached ready-creative counts per ad format, one entry per tab
pub struct FormatCountCache {
    store: Arc<dyn CreativeStore>,
    cache: Cache<&'static str, Arc<HashMap<AdFormat, u64>>>,
}

impl FormatCountCache {
    pub fn new(store: Arc<dyn CreativeStore>, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(config.network_counts_ttl_secs))
            .build();
        Self { store, cache }
    }

    pub async fn counts(&self) -> Result<HashMap<AdFormat, u64>> {
        let store = Arc::clone(&self.store);
        let entry = self
            .cache
            .try_get_with(FORMAT_COUNTS_KEY, async move {
                debug!("refreshing format counts");
                let observed = store.format_counts().await?;
                let mut counts: HashMap<AdFormat, u64> =
                    AdFormat::ALL.iter().map(|f| (*f, 0)).collect();
                for (format, count) in observed {
                    counts.insert(format, count);
                }
                Ok::<_, EngineError>(Arc::new(counts))
            })
            .await
            .map_err(|e: Arc<EngineError>| EngineError::store(e.to_string()))?;
        Ok(entry.as_ref().clone())
    }

    pub async fn invalidate(&self) {
        self.cache.invalidate(&FORMAT_COUNTS_KEY).await;
    }
}
