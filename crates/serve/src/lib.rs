//! AdScout Serve Library
//!
//! HTTP surface for the creative discovery engine: listing, filter
//! validation, option catalogs, similar creatives, and a health check.

pub mod api;
pub mod handlers;
pub mod server;

pub use handlers::AppState;
pub use server::{AdscoutServer, ServerBuilder};

/// Server version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
    pub max_request_size: usize,
    /// Seed the in-memory store with demo creatives at startup
    pub seed_demo: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            cors_enabled: true,
            max_request_size: 1024 * 1024, // 1MB
            seed_demo: true,
        }
    }
}
