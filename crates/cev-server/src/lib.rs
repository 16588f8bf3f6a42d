//! CEV Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! HTTP service for the Chemical Equipment Visualizer.
//!
//! # Overview
//!
//! - **Ingestion**: CSV uploads are validated and aggregated by `cev-ingest`,
//!   then stored atomically together with their equipment rows
//! - **Retention**: after every upload only the newest datasets are kept
//! - **Reports**: `cev-report` renders a paginated PDF per dataset
//! - **Storage**: SQLite through SQLx with embedded migrations
//!
//! # Architecture
//!
//! Features are CQRS slices: commands (`ingest`, `delete`) write through the
//! [`db::DatasetStore`] single-writer path, queries read consistent snapshots.
//!
//! # Example
//!
//! ```no_run
//! use cev_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     db::run_migrations(&pool).await?;
//!     let retention = db::RetentionPolicy::from_limit(config.datasets.retention_limit)
//!         .unwrap_or_default();
//!     let store = db::DatasetStore::new(pool, retention);
//!     let app = api::create_router(api::AppState { store }, &config);
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod middleware;
