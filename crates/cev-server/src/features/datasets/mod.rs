//! Dataset feature: CSV ingestion, dataset reads, deletion and PDF reports

pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{
    DeleteDatasetCommand, DeleteDatasetError, DeleteDatasetResponse, IngestDatasetCommand,
    IngestDatasetError, IngestDatasetResponse,
};
pub use queries::{
    GenerateReportError, GenerateReportQuery, GenerateReportResponse, GetDatasetError,
    GetDatasetQuery, GetDatasetSummaryQuery, ListDatasetsError, ListDatasetsQuery,
    ListDatasetsResponse,
};
pub use routes::datasets_routes;
