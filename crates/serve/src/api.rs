//! API routes for the AdScout serve crate

use axum::{routing::get, Router};

use crate::handlers::{
    self, AppState,
};

/// API routes configuration
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/creatives", get(handlers::list_creatives))
        .route(
            "/api/creatives/filters/validate",
            get(handlers::validate_filters),
        )
        .route(
            "/api/creatives/filters/options",
            get(handlers::filter_options),
        )
        .route("/api/creatives/:id/similar", get(handlers::similar_creatives))
        .route("/api/health", get(handlers::health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_build() {
        let state = AppState::demo(crate::ServerConfig {
            seed_demo: false,
            ..crate::ServerConfig::default()
        })
        .await;
        let _app: Router = create_routes().with_state(state);
    }
}
