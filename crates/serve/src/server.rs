//! Server module for the AdScout serve crate

use std::net::SocketAddr;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

use adscout_core::{EngineError, Result};

use crate::api::create_routes;
use crate::handlers::AppState;
use crate::ServerConfig;

/// AdScout HTTP server
pub struct AdscoutServer {
    config: ServerConfig,
    app: Router,
}

impl AdscoutServer {
    /// Create a new server instance backed by the demo state
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let state = AppState::demo(config.clone()).await;
        let app = create_app(&config, state)?;
        Ok(Self { config, app })
    }

    /// Create a server around pre-built application state
    pub fn with_state(config: ServerConfig, state: AppState) -> Result<Self> {
        let app = create_app(&config, state)?;
        Ok(Self { config, app })
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| EngineError::config(format!("Invalid address {}: {}", addr, e)))?;

        tracing::info!("Starting AdScout server on {}", addr);

        let listener = tokio::net::TcpListener::bind(socket_addr)
            .await
            .map_err(|e| EngineError::store(format!("Failed to bind to {}: {}", addr, e)))?;

        axum::serve(listener, self.app)
            .await
            .map_err(|e| EngineError::store(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// Create the Axum application with middleware
fn create_app(config: &ServerConfig, state: AppState) -> Result<Router> {
    let mut app = create_routes().with_state(state);

    app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(config.max_request_size)),
    );

    if config.cors_enabled {
        let origin = "*"
            .parse::<HeaderValue>()
            .map_err(|e| EngineError::config(format!("Invalid CORS origin: {}", e)))?;
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET])
            .allow_headers([ACCEPT, AUTHORIZATION, CONTENT_TYPE]);
        app = app.layer(cors);
    }

    Ok(app)
}

/// Server builder for configuration
pub struct ServerBuilder {
    config: ServerConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Set the host address
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Enable or disable CORS
    pub fn cors(mut self, enabled: bool) -> Self {
        self.config.cors_enabled = enabled;
        self
    }

    /// Set the maximum request body size in bytes
    pub fn max_request_size(mut self, bytes: usize) -> Self {
        self.config.max_request_size = bytes;
        self
    }

    /// Enable or disable demo data seeding
    pub fn seed_demo(mut self, enabled: bool) -> Self {
        self.config.seed_demo = enabled;
        self
    }

    /// Build the server
    pub async fn build(self) -> Result<AdscoutServer> {
        AdscoutServer::new(self.config).await
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
