//! Dataset store
//!
//! All writes go through one async mutex, so creating a dataset, inserting its
//! rows and trimming to the retention limit happen as a single serialized
//! transaction. Reads take no lock; a dataset and its rows are read inside one
//! transaction so a reader sees either all of an upload or none of it.

use std::sync::Arc;

use cev_common::{DatasetDetail, DatasetSummary, Equipment, EquipmentTypes, Principal};
use cev_ingest::Aggregation;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use thiserror::Error;
use tokio::sync::Mutex;

use super::retention::RetentionPolicy;

// Eight bound parameters per row keeps each statement well under SQLite's limit.
const INSERT_CHUNK_ROWS: usize = 500;

const SUMMARY_COLUMNS: &str = r#"
    SELECT d.id, d.name, d.created_at, d.principal_id, p.username AS principal_name,
           d.total_count, d.avg_flowrate, d.avg_pressure, d.avg_temperature, d.equipment_types
    FROM datasets d
    LEFT JOIN principals p ON p.id = d.principal_id
"#;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Dataset {0} not found")]
    NotFound(i64),

    #[error("Stored dataset is inconsistent: {0}")]
    Corrupt(String),
}

/// Result of a successful create.
#[derive(Debug, Clone)]
pub struct CreatedDataset {
    pub dataset: DatasetDetail,
    /// Datasets removed by retention in the same transaction.
    pub evicted: Vec<i64>,
}

#[derive(sqlx::FromRow)]
struct DatasetRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    principal_id: Option<String>,
    principal_name: Option<String>,
    total_count: i64,
    avg_flowrate: f64,
    avg_pressure: f64,
    avg_temperature: f64,
    equipment_types: String,
}

impl TryFrom<DatasetRow> for DatasetSummary {
    type Error = StoreError;

    fn try_from(row: DatasetRow) -> Result<Self, Self::Error> {
        let equipment_types: EquipmentTypes = serde_json::from_str(&row.equipment_types)
            .map_err(|e| StoreError::Corrupt(format!("dataset {} equipment_types: {}", row.id, e)))?;
        let total_count = u64::try_from(row.total_count)
            .map_err(|_| StoreError::Corrupt(format!("dataset {} total_count is negative", row.id)))?;

        Ok(DatasetSummary {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
            principal_id: row.principal_id,
            principal_name: row.principal_name,
            total_count,
            avg_flowrate: row.avg_flowrate,
            avg_pressure: row.avg_pressure,
            avg_temperature: row.avg_temperature,
            equipment_types,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EquipmentRow {
    id: i64,
    name: String,
    equipment_type: String,
    flowrate: f64,
    pressure: f64,
    temperature: f64,
}

impl From<EquipmentRow> for Equipment {
    fn from(row: EquipmentRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            equipment_type: row.equipment_type,
            flowrate: row.flowrate,
            pressure: row.pressure,
            temperature: row.temperature,
        }
    }
}

async fn fetch_summary(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<DatasetSummary>, StoreError> {
    let row: Option<DatasetRow> = sqlx::query_as(&format!("{SUMMARY_COLUMNS} WHERE d.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.map(DatasetSummary::try_from).transpose()
}

async fn fetch_detail(
    conn: &mut SqliteConnection,
    id: i64,
) -> Result<Option<DatasetDetail>, StoreError> {
    let Some(summary) = fetch_summary(&mut *conn, id).await? else {
        return Ok(None);
    };

    let rows: Vec<EquipmentRow> = sqlx::query_as(
        r#"
        SELECT id, name, equipment_type, flowrate, pressure, temperature
        FROM equipment
        WHERE dataset_id = ?
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    if rows.len() as u64 != summary.total_count {
        return Err(StoreError::Corrupt(format!(
            "dataset {} has {} equipment rows but total_count {}",
            id,
            rows.len(),
            summary.total_count
        )));
    }

    Ok(Some(DatasetDetail {
        summary,
        equipment: rows.into_iter().map(Equipment::from).collect(),
    }))
}

/// Handle to the dataset tables. Cheap to clone; clones share the writer lock.
#[derive(Clone)]
pub struct DatasetStore {
    pool: SqlitePool,
    writer: Arc<Mutex<()>>,
    retention: RetentionPolicy,
}

impl DatasetStore {
    pub fn new(pool: SqlitePool, retention: RetentionPolicy) -> Self {
        Self {
            pool,
            writer: Arc::new(Mutex::new(())),
            retention,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Persist an ingested upload and trim older datasets.
    ///
    /// The principal record is upserted, then the dataset, its rows and the
    /// retention step run in one transaction. Either everything is visible
    /// afterwards or nothing is.
    #[tracing::instrument(skip(self, principal, aggregation), fields(rows = aggregation.rows.len()))]
    pub async fn create(
        &self,
        name: &str,
        principal: Option<&Principal>,
        aggregation: &Aggregation,
    ) -> Result<CreatedDataset, StoreError> {
        let aggregate = &aggregation.aggregate;
        let equipment_types = serde_json::to_string(&aggregate.equipment_types)
            .map_err(|e| StoreError::Corrupt(format!("equipment_types not serializable: {e}")))?;
        let total_count = i64::try_from(aggregate.total_count)
            .map_err(|_| StoreError::Corrupt("total_count out of range".to_string()))?;

        let _guard = self.writer.lock().await;
        let mut tx = self.pool.begin().await?;

        if let Some(principal) = principal {
            sqlx::query(
                r#"
                INSERT INTO principals (id, username) VALUES (?, ?)
                ON CONFLICT (id) DO UPDATE SET username = excluded.username
                "#,
            )
            .bind(&principal.id)
            .bind(&principal.username)
            .execute(&mut *tx)
            .await?;
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO datasets
                (name, created_at, principal_id, total_count,
                 avg_flowrate, avg_pressure, avg_temperature, equipment_types)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(name)
        .bind(Utc::now())
        .bind(principal.map(|p| p.id.as_str()))
        .bind(total_count)
        .bind(aggregate.avg_flowrate)
        .bind(aggregate.avg_pressure)
        .bind(aggregate.avg_temperature)
        .bind(equipment_types)
        .fetch_one(&mut *tx)
        .await?;

        for (chunk_index, chunk) in aggregation.rows.chunks(INSERT_CHUNK_ROWS).enumerate() {
            let offset = chunk_index * INSERT_CHUNK_ROWS;
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO equipment (dataset_id, position, name, equipment_type, flowrate, pressure, temperature) ",
            );
            builder.push_values(chunk.iter().enumerate(), |mut values, (i, row)| {
                values
                    .push_bind(id)
                    .push_bind((offset + i) as i64)
                    .push_bind(row.name.as_str())
                    .push_bind(row.equipment_type.as_str())
                    .push_bind(row.flowrate)
                    .push_bind(row.pressure)
                    .push_bind(row.temperature);
            });
            builder.build().execute(&mut *tx).await?;
        }

        let evicted = self.retention.enforce(&mut tx).await?;

        let dataset = fetch_detail(&mut tx, id)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        tx.commit().await?;

        tracing::info!(
            dataset_id = id,
            total_count = aggregate.total_count,
            evicted = ?evicted,
            "Dataset stored"
        );

        Ok(CreatedDataset { dataset, evicted })
    }

    /// Newest datasets first, at most `limit`.
    pub async fn list_recent(&self, limit: u32) -> Result<Vec<DatasetSummary>, StoreError> {
        let rows: Vec<DatasetRow> = sqlx::query_as(&format!("{SUMMARY_COLUMNS} ORDER BY d.id DESC LIMIT ?"))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(DatasetSummary::try_from).collect()
    }

    pub async fn get_summary(&self, id: i64) -> Result<DatasetSummary, StoreError> {
        let mut conn = self.pool.acquire().await?;
        fetch_summary(&mut conn, id)
            .await?
            .ok_or(StoreError::NotFound(id))
    }

    /// A dataset with its rows, read from one snapshot.
    pub async fn get_detail(&self, id: i64) -> Result<DatasetDetail, StoreError> {
        let mut tx = self.pool.begin().await?;
        let detail = fetch_detail(&mut tx, id).await?;
        tx.commit().await?;
        detail.ok_or(StoreError::NotFound(id))
    }

    /// Remove a dataset and its equipment rows.
    pub async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let _guard = self.writer.lock().await;
        let result = sqlx::query("DELETE FROM datasets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        tracing::info!(dataset_id = id, "Dataset deleted");
        Ok(())
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM datasets")
            .fetch_one(&self.pool)
            .await?;
        u64::try_from(count).map_err(|_| StoreError::Corrupt("negative dataset count".to_string()))
    }

    /// Drop a principal record. Their datasets stay and lose the uploader name.
    ///
    /// Returns `false` when no such principal was recorded.
    pub async fn forget_principal(&self, principal_id: &str) -> Result<bool, StoreError> {
        let _guard = self.writer.lock().await;
        let result = sqlx::query("DELETE FROM principals WHERE id = ?")
            .bind(principal_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
