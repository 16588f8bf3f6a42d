//! CEV Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types and utilities for the Chemical Equipment Visualizer workspace.
//!
//! # Overview
//!
//! - **Types**: the dataset aggregate, its equipment rows, and the principal
//!   that performed an upload
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use cev_common::logging::{init_logging, LogConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_logging(&LogConfig::from_env()?)?;
//!     tracing::info!("ready");
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod types;

pub use types::{DatasetDetail, DatasetSummary, Equipment, EquipmentTypes, Principal};
