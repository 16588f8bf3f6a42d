use serde::{Deserialize, Serialize};

use crate::db::{DatasetStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetCommand {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDatasetResponse {
    pub id: i64,
    pub deleted: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteDatasetError {
    #[error("Dataset {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for DeleteDatasetError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: DatasetStore,
    command: DeleteDatasetCommand,
) -> Result<DeleteDatasetResponse, DeleteDatasetError> {
    store.delete(command.id).await?;

    Ok(DeleteDatasetResponse {
        id: command.id,
        deleted: true,
    })
}
