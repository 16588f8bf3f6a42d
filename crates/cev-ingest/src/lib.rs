//! CEV Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Turns an uploaded equipment CSV into a dataset aggregate plus one draft row
//! per input row. Nothing here touches storage: a rejected upload never gets
//! past this crate.
//!
//! # Pipeline
//!
//! 1. [`table::TabularPayload::from_csv`] reads the header and rows
//! 2. [`schema::validate_schema`] checks the required columns
//! 3. [`aggregate::aggregate`] computes counts, averages and the type distribution
//!
//! # Example
//!
//! ```
//! let csv = b"Equipment Name,Type,Flowrate,Pressure,Temperature\nP-1,Pump,10,2,25\n";
//! let upload = cev_ingest::ingest_csv(csv).unwrap();
//! assert_eq!(upload.aggregate.total_count, 1);
//! ```

pub mod aggregate;
pub mod error;
pub mod schema;
pub mod table;

pub use aggregate::{aggregate, Aggregation, DatasetAggregate, EquipmentDraft};
pub use error::{IngestError, MalformedRow, ValidationError};
pub use schema::{validate_schema, RequiredColumns, REQUIRED_COLUMNS};
pub use table::TabularPayload;

/// Read, validate and aggregate a CSV upload in one deterministic pass.
#[tracing::instrument(skip(bytes), fields(bytes = bytes.len()))]
pub fn ingest_csv(bytes: &[u8]) -> Result<Aggregation, IngestError> {
    let payload = TabularPayload::from_csv(bytes)?;
    ingest_payload(&payload)
}

/// Validate and aggregate an already-parsed table.
pub fn ingest_payload(payload: &TabularPayload) -> Result<Aggregation, IngestError> {
    let columns = validate_schema(payload.columns())?;
    let aggregation = aggregate(payload, &columns)?;

    tracing::debug!(
        rows = aggregation.rows.len(),
        categories = aggregation.aggregate.equipment_types.len(),
        "Upload aggregated"
    );

    Ok(aggregation)
}
