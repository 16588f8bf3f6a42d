//! Feature modules implementing the CEV API
//!
//! Each feature is a vertical slice with its own commands, queries and routes.
//!
//! # Features
//!
//! - **datasets**: upload ingestion, dataset reads, deletion and reports
//! - **shared**: principal extraction and input validation used by all slices

pub mod datasets;
pub mod shared;

use axum::Router;

use crate::db::DatasetStore;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub store: DatasetStore,
    /// Request body limit for uploads, in bytes.
    pub max_upload_bytes: usize,
}

/// Creates the router with all feature routes mounted
///
/// - `/datasets` - Dataset ingestion, reads and reports
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest(
        "/datasets",
        datasets::datasets_routes(state.max_upload_bytes).with_state(state.store),
    )
}
