//! Error types for upload ingestion

use thiserror::Error;

/// The upload was rejected before any row was interpreted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File is not a readable CSV table: {0}")]
    NotTabular(String),

    #[error("Missing columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("File contains no equipment rows")]
    Empty,
}

/// A measurement cell that does not hold a finite number.
///
/// `row` counts data rows from 1 and does not include the header line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Malformed row {row}: column '{column}' has non-numeric value '{value}'")]
pub struct MalformedRow {
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// Any reason an upload cannot become a dataset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    MalformedRow(#[from] MalformedRow),
}

impl From<csv::Error> for ValidationError {
    fn from(err: csv::Error) -> Self {
        ValidationError::NotTabular(err.to_string())
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Validation(err.into())
    }
}
