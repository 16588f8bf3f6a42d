pub mod response;

use crate::config::Config;
use crate::db::{self, DatasetStore};
use crate::features;
use crate::middleware;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::compression::CompressionLayer;

use self::response::ErrorResponse;

#[derive(Clone)]
pub struct AppState {
    pub store: DatasetStore,
}

/// Build the application router with all routes and middleware.
pub fn create_router(state: AppState, config: &Config) -> Router {
    let feature_state = features::FeatureState {
        store: state.store.clone(),
        max_upload_bytes: config.datasets.max_upload_bytes,
    };

    Router::new()
        .route("/health", get(health_check))
        .with_state(state)
        .merge(features::router(feature_state))
        // Applied innermost-first so the stack matches cors -> trace -> compression;
        // each Router::layer maps the body back to axum's Body (which Cors requires).
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

async fn health_check(State(state): State<AppState>) -> Response {
    match db::health_check(state.store.pool()).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected",
                "version": env!("CARGO_PKG_VERSION")
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            ErrorResponse::new("SERVICE_UNAVAILABLE", "Database is unreachable")
                .with_status(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}
