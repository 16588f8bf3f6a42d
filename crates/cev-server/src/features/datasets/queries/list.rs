use cev_common::DatasetSummary;
use serde::{Deserialize, Serialize};

use crate::db::{DatasetStore, StoreError};

/// Newest datasets first. `limit` defaults to, and may not exceed, the
/// retention limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDatasetsQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDatasetsResponse {
    pub items: Vec<DatasetSummary>,
    pub limit: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ListDatasetsError {
    #[error("Limit must be between 1 and {max}")]
    InvalidLimit { max: u32 },
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl ListDatasetsQuery {
    pub fn validate(&self, max: u32) -> Result<(), ListDatasetsError> {
        match self.limit {
            Some(limit) if limit == 0 || limit > max => Err(ListDatasetsError::InvalidLimit { max }),
            _ => Ok(()),
        }
    }

    pub fn effective_limit(&self, max: u32) -> u32 {
        self.limit.unwrap_or(max)
    }
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: DatasetStore,
    query: ListDatasetsQuery,
) -> Result<ListDatasetsResponse, ListDatasetsError> {
    let max = store.retention().keep();
    query.validate(max)?;

    let limit = query.effective_limit(max);
    let items = store.list_recent(limit).await?;

    Ok(ListDatasetsResponse { items, limit })
}
