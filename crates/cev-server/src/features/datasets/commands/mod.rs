pub mod delete;
pub mod ingest;

pub use delete::{DeleteDatasetCommand, DeleteDatasetError, DeleteDatasetResponse};
pub use ingest::{IngestDatasetCommand, IngestDatasetError, IngestDatasetResponse};
