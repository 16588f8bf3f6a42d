use cev_common::{DatasetDetail, Principal};
use cev_ingest::IngestError;
use serde::Serialize;

use crate::db::{DatasetStore, StoreError};
use crate::features::shared::validation::{validate_upload_name, UploadNameError};

/// Ingest one uploaded CSV file as a new dataset.
#[derive(Clone)]
pub struct IngestDatasetCommand {
    /// Original file name; becomes the dataset name.
    pub file_name: String,
    pub content: Vec<u8>,
    pub principal: Option<Principal>,
}

impl std::fmt::Debug for IngestDatasetCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestDatasetCommand")
            .field("file_name", &self.file_name)
            .field("content_len", &self.content.len())
            .field("principal", &self.principal)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestDatasetResponse {
    pub dataset: DatasetDetail,
    /// Older datasets removed to stay within the retention limit.
    pub evicted: Vec<i64>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestDatasetError {
    #[error("No file was uploaded")]
    FileRequired,
    #[error(transparent)]
    Name(#[from] UploadNameError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
    #[error("Upload processing was interrupted: {0}")]
    Interrupted(String),
}

impl IngestDatasetCommand {
    pub fn validate(&self) -> Result<(), IngestDatasetError> {
        validate_upload_name(&self.file_name)?;
        Ok(())
    }
}

#[tracing::instrument(
    skip(store, command),
    fields(file_name = %command.file_name, bytes = command.content.len())
)]
pub async fn handle(
    store: DatasetStore,
    command: IngestDatasetCommand,
) -> Result<IngestDatasetResponse, IngestDatasetError> {
    command.validate()?;

    let IngestDatasetCommand {
        file_name,
        content,
        principal,
    } = command;

    let aggregation = tokio::task::spawn_blocking(move || cev_ingest::ingest_csv(&content))
        .await
        .map_err(|e| IngestDatasetError::Interrupted(e.to_string()))?
        .inspect_err(|e| tracing::info!(error = %e, "Upload rejected"))?;

    let created = store
        .create(&file_name, principal.as_ref(), &aggregation)
        .await?;

    Ok(IngestDatasetResponse {
        dataset: created.dataset,
        evicted: created.evicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(file_name: &str) -> IngestDatasetCommand {
        IngestDatasetCommand {
            file_name: file_name.to_string(),
            content: b"Equipment Name,Type,Flowrate,Pressure,Temperature\n".to_vec(),
            principal: None,
        }
    }

    #[test]
    fn test_validation_success() {
        assert!(command("plant.csv").validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_non_csv() {
        assert!(matches!(
            command("plant.xlsx").validate(),
            Err(IngestDatasetError::Name(UploadNameError::NotCsv))
        ));
    }

    #[test]
    fn test_debug_omits_content() {
        let rendered = format!("{:?}", command("plant.csv"));
        assert!(rendered.contains("content_len"));
        assert!(!rendered.contains("Equipment Name"));
    }
}
