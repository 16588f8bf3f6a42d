use cev_report::{RenderedReport, ReportError};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::{DatasetStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReportQuery {
    pub id: i64,
}

#[derive(Debug, Clone)]
pub struct GenerateReportResponse {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl From<RenderedReport> for GenerateReportResponse {
    fn from(report: RenderedReport) -> Self {
        Self {
            file_name: report.file_name,
            bytes: report.bytes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateReportError {
    #[error("Dataset {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Store(StoreError),
    #[error("Report generation failed: {0}")]
    Render(#[from] ReportError),
    #[error("Report generation was interrupted: {0}")]
    Interrupted(String),
}

impl From<StoreError> for GenerateReportError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Render the PDF report of a stored dataset.
///
/// The dataset is read from one snapshot, so a concurrent eviction either
/// happens before the read (not found) or after it (report still complete).
#[tracing::instrument(skip(store))]
pub async fn handle(
    store: DatasetStore,
    query: GenerateReportQuery,
) -> Result<GenerateReportResponse, GenerateReportError> {
    let detail = store.get_detail(query.id).await?;
    let generated_at = Utc::now();

    let report = tokio::task::spawn_blocking(move || cev_report::render_report(&detail, generated_at))
        .await
        .map_err(|e| GenerateReportError::Interrupted(e.to_string()))?
        .inspect_err(|e| tracing::error!(dataset_id = query.id, error = %e, "Report rendering failed"))?;

    tracing::info!(
        dataset_id = query.id,
        pages = report.page_count,
        bytes = report.bytes.len(),
        "Report generated"
    );

    Ok(report.into())
}
