use cev_common::DatasetSummary;
use serde::{Deserialize, Serialize};

use super::get::GetDatasetError;
use crate::db::DatasetStore;

/// The aggregate of one dataset without its equipment rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDatasetSummaryQuery {
    pub id: i64,
}

#[tracing::instrument(skip(store))]
pub async fn handle(
    store: DatasetStore,
    query: GetDatasetSummaryQuery,
) -> Result<DatasetSummary, GetDatasetError> {
    Ok(store.get_summary(query.id).await?)
}
