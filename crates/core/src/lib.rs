//! AdScout Core Library
//!
//! Discovery and filtering engine for ad creatives. This library provides
//! filter normalization, pagination, option catalogs, the response envelope,
//! the similar-creative recommender, and the batch favorite resolver, all
//! behind pluggable store and identity ports.

pub mod cache;
pub mod config;
pub mod envelope;
pub mod error;
pub mod favorites;
pub mod filters;
pub mod options;
pub mod pagination;
pub mod recommend;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use cache::{CountryAllowList, FormatCountCache, NetworkCountCache};
pub use config::{CacheConfig, EngineConfig, SimilarConfig};
pub use envelope::{ResponsePayload, ResponseStatus};
pub use error::{EngineError, Result};
pub use favorites::FavoriteResolver;
pub use filters::{
    FilterNormalizer, FilterSet, Mode, SortKey, ValidationReport, ALLOWED_PAGE_SIZES,
};
pub use options::{OptionSource, SelectableOption};
pub use pagination::PageInfo;
pub use recommend::{Recommender, SimilarPage};
pub use store::{
    AccessProvider, CandidateOrder, CandidateQuery, CreativeStore, FavoriteStore, MemoryStore,
};
pub use types::{AdFormat, Creative, CreativeCard, CreativeId, CreativeStatus, UserId};

/// Initialize logging with JSON formatting
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adscout_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    Ok(())
}

/// Initialize logging with custom configuration
pub fn init_logging_with_config(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::new(level);
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "text" | "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        "compact" => {
            registry
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            return Err(EngineError::config(format!(
                "Unknown log format: {}",
                format
            )));
        }
    }

    Ok(())
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get version info as a formatted string
pub fn version_info() -> String {
    format!("{} v{}", NAME, VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let info = version_info();
        assert!(info.contains("adscout-core"));
        assert!(info.contains('v'));
    }

    #[test]
    fn test_unknown_log_format_rejected() {
        let err = init_logging_with_config("info", "yaml").unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }
}
