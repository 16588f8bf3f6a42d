use cev_common::DatasetDetail;
use serde::{Deserialize, Serialize};

use crate::db::{DatasetStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetQuery {
    pub id: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum GetDatasetError {
    #[error("Dataset {0} not found")]
    NotFound(i64),
    #[error("Database error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for GetDatasetError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(store: DatasetStore, query: GetDatasetQuery) -> Result<DatasetDetail, GetDatasetError> {
    Ok(store.get_detail(query.id).await?)
}
