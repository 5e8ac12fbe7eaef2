//! Configuration types for the AdScout core engine

use serde::{Deserialize, Serialize};

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Cache settings for the two read-through caches
    #[serde(default)]
    pub cache: CacheConfig,
    /// Recommender settings
    #[serde(default)]
    pub similar: SimilarConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            similar: SimilarConfig::default(),
        }
    }
}

/// TTL settings for the engine caches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL for the active-country allow-list, in seconds
    pub country_ttl_secs: u64,
    /// TTL for the per-network creative counts, in seconds
    pub network_counts_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            country_ttl_secs: 3600,
            network_counts_ttl_secs: 600,
        }
    }
}

/// Recommender settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarConfig {
    /// Default number of similar creatives returned when the caller gives no limit
    pub default_limit: usize,
    /// Upper bound on the per-request limit
    pub max_limit: usize,
}

impl Default for SimilarConfig {
    fn default() -> Self {
        Self {
            default_limit: 6,
            max_limit: 48,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttls() {
        let config = EngineConfig::default();
        assert_eq!(config.cache.country_ttl_secs, 3600);
        assert_eq!(config.cache.network_counts_ttl_secs, 600);
        assert_eq!(config.similar.default_limit, 6);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"cache":{"country_ttl_secs":60,"network_counts_ttl_secs":30}}"#)
                .unwrap();
        assert_eq!(config.cache.country_ttl_secs, 60);
        assert_eq!(config.similar.default_limit, 6);
    }
}
