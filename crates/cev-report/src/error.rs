use thiserror::Error;

/// Failure while producing a report document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("Report layout failed: {0}")]
    Layout(String),

    #[error("PDF serialization failed: {0}")]
    Pdf(String),
}
