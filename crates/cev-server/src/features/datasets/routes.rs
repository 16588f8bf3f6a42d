//! Dataset API routes
//!
//! # Route Structure
//!
//! - `GET /datasets` - Most recent datasets, newest first
//! - `POST /datasets/upload` - Ingest a CSV upload (multipart field `file`)
//! - `GET /datasets/:id` - One dataset with its equipment rows
//! - `GET /datasets/:id/summary` - One dataset without rows
//! - `GET /datasets/:id/report` - PDF report download
//! - `DELETE /datasets/:id` - Remove a dataset and its rows
//!
//! Every route requires an authenticated principal.

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::db::DatasetStore;
use crate::features::shared::AuthenticatedPrincipal;
use axum::{
    extract::{
        multipart::MultipartError, rejection::PathRejection, DefaultBodyLimit, FromRequestParts,
        Multipart, Path, Query, State,
    },
    http::{header, request::Parts, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use cev_ingest::{IngestError, ValidationError};
use serde_json::json;

use super::{
    commands::{DeleteDatasetCommand, DeleteDatasetError, IngestDatasetCommand, IngestDatasetError},
    queries::{
        GenerateReportError, GenerateReportQuery, GetDatasetError, GetDatasetQuery,
        GetDatasetSummaryQuery, ListDatasetsError, ListDatasetsQuery,
    },
};

/// Name of the multipart field carrying the CSV file.
pub const UPLOAD_FIELD: &str = "file";

/// Creates the datasets router. Upload bodies larger than `max_upload_bytes`
/// are rejected with `413`.
pub fn datasets_routes(max_upload_bytes: usize) -> Router<DatasetStore> {
    Router::new()
        .route("/", get(list_datasets))
        .route(
            "/upload",
            post(upload_dataset).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/:id", get(get_dataset).delete(delete_dataset))
        .route("/:id/summary", get(get_dataset_summary))
        .route("/:id/report", get(download_report))
}

/// The `:id` path segment. A non-integer id is a `VALIDATION_ERROR`.
struct DatasetId(i64);

#[axum::async_trait]
impl<S> FromRequestParts<S> for DatasetId
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<i64>::from_request_parts(parts, state)
            .await
            .map(|Path(id)| Self(id))
            .map_err(|rejection: PathRejection| {
                ErrorResponse::new(
                    "VALIDATION_ERROR",
                    format!("Invalid dataset id: {}", rejection.body_text()),
                )
                .with_status(StatusCode::BAD_REQUEST)
            })
    }
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Ingest an uploaded CSV file
///
/// # Response
///
/// - `201 Created` - Dataset stored; `meta.evicted` lists datasets removed by retention
/// - `400 Bad Request` - Bad file name, missing columns or a non-numeric measurement
/// - `401 Unauthorized` - No principal
/// - `413 Payload Too Large` - Body exceeds the upload limit
#[tracing::instrument(skip(store, principal, multipart), fields(principal_id = %principal.id))]
async fn upload_dataset(
    State(store): State<DatasetStore>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    mut multipart: Multipart,
) -> Result<Response, DatasetApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, content) = upload.ok_or(IngestDatasetError::FileRequired)?;

    let command = IngestDatasetCommand {
        file_name,
        content,
        principal: Some(principal),
    };

    let response = super::commands::ingest::handle(store, command).await?;

    tracing::info!(
        dataset_id = response.dataset.summary.id,
        total_count = response.dataset.summary.total_count,
        evicted = ?response.evicted,
        "Dataset uploaded via API"
    );

    let meta = json!({ "evicted": response.evicted });
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_meta(response.dataset, meta)),
    )
        .into_response())
}

/// Delete a dataset and its equipment rows
#[tracing::instrument(skip(store, _principal))]
async fn delete_dataset(
    State(store): State<DatasetStore>,
    _principal: AuthenticatedPrincipal,
    DatasetId(id): DatasetId,
) -> Result<Response, DatasetApiError> {
    let response = super::commands::delete::handle(store, DeleteDatasetCommand { id }).await?;

    tracing::info!(dataset_id = id, "Dataset deleted via API");

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

#[tracing::instrument(skip(store, _principal))]
async fn list_datasets(
    State(store): State<DatasetStore>,
    _principal: AuthenticatedPrincipal,
    Query(query): Query<ListDatasetsQuery>,
) -> Result<Response, DatasetApiError> {
    let response = super::queries::list::handle(store, query).await?;

    let meta = json!({ "limit": response.limit, "count": response.items.len() });
    Ok((
        StatusCode::OK,
        Json(ApiResponse::success_with_meta(response.items, meta)),
    )
        .into_response())
}

#[tracing::instrument(skip(store, _principal))]
async fn get_dataset(
    State(store): State<DatasetStore>,
    _principal: AuthenticatedPrincipal,
    DatasetId(id): DatasetId,
) -> Result<Response, DatasetApiError> {
    let detail = super::queries::get::handle(store, GetDatasetQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(detail))).into_response())
}

#[tracing::instrument(skip(store, _principal))]
async fn get_dataset_summary(
    State(store): State<DatasetStore>,
    _principal: AuthenticatedPrincipal,
    DatasetId(id): DatasetId,
) -> Result<Response, DatasetApiError> {
    let summary = super::queries::summary::handle(store, GetDatasetSummaryQuery { id }).await?;
    Ok((StatusCode::OK, Json(ApiResponse::success(summary))).into_response())
}

/// Download the PDF report of a dataset
///
/// # Response
///
/// - `200 OK` - `application/pdf` body sent as an attachment
/// - `404 Not Found` - No such dataset
/// - `500 Internal Server Error` - Rendering failed (`REPORT_GENERATION_FAILED`)
#[tracing::instrument(skip(store, _principal))]
async fn download_report(
    State(store): State<DatasetStore>,
    _principal: AuthenticatedPrincipal,
    DatasetId(id): DatasetId,
) -> Result<Response, DatasetApiError> {
    let report = super::queries::report::handle(store, GenerateReportQuery { id }).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", report.file_name))
        .map_err(|e| GenerateReportError::Interrupted(format!("invalid file name header: {e}")))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(cev_report::PDF_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.bytes,
    )
        .into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
enum DatasetApiError {
    Multipart(MultipartError),
    Ingest(IngestDatasetError),
    Delete(DeleteDatasetError),
    List(ListDatasetsError),
    Get(GetDatasetError),
    Report(GenerateReportError),
}

impl From<MultipartError> for DatasetApiError {
    fn from(err: MultipartError) -> Self {
        Self::Multipart(err)
    }
}

impl From<IngestDatasetError> for DatasetApiError {
    fn from(err: IngestDatasetError) -> Self {
        Self::Ingest(err)
    }
}

impl From<DeleteDatasetError> for DatasetApiError {
    fn from(err: DeleteDatasetError) -> Self {
        Self::Delete(err)
    }
}

impl From<ListDatasetsError> for DatasetApiError {
    fn from(err: ListDatasetsError) -> Self {
        Self::List(err)
    }
}

impl From<GetDatasetError> for DatasetApiError {
    fn from(err: GetDatasetError) -> Self {
        Self::Get(err)
    }
}

impl From<GenerateReportError> for DatasetApiError {
    fn from(err: GenerateReportError) -> Self {
        Self::Report(err)
    }
}

fn not_found(id: i64) -> Response {
    ErrorResponse::new("NOT_FOUND", format!("Dataset {} not found", id)).with_status(StatusCode::NOT_FOUND)
}

fn internal(err: &DatasetApiError) -> Response {
    tracing::error!("Dataset request failed: {}", err);
    ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for DatasetApiError {
    fn into_response(self) -> Response {
        match &self {
            DatasetApiError::Multipart(err) => {
                let status = err.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "PAYLOAD_TOO_LARGE"
                } else {
                    "VALIDATION_ERROR"
                };
                let status = if status.is_client_error() { status } else { StatusCode::BAD_REQUEST };
                ErrorResponse::new(code, err.body_text()).with_status(status)
            },

            // Ingest errors
            DatasetApiError::Ingest(IngestDatasetError::FileRequired)
            | DatasetApiError::Ingest(IngestDatasetError::Name(_)) => {
                ErrorResponse::new("VALIDATION_ERROR", self.to_string()).with_status(StatusCode::BAD_REQUEST)
            },
            DatasetApiError::Ingest(IngestDatasetError::Ingest(IngestError::Validation(
                ValidationError::MissingColumns(missing),
            ))) => ErrorResponse::with_details(
                "VALIDATION_ERROR",
                self.to_string(),
                json!({ "missing_columns": missing }),
            )
            .with_status(StatusCode::BAD_REQUEST),
            DatasetApiError::Ingest(IngestDatasetError::Ingest(IngestError::Validation(_))) => {
                ErrorResponse::new("VALIDATION_ERROR", self.to_string()).with_status(StatusCode::BAD_REQUEST)
            },
            DatasetApiError::Ingest(IngestDatasetError::Ingest(IngestError::MalformedRow(row))) => {
                ErrorResponse::with_details(
                    "MALFORMED_ROW",
                    self.to_string(),
                    json!({ "row": row.row, "column": row.column, "value": row.value }),
                )
                .with_status(StatusCode::BAD_REQUEST)
            },
            DatasetApiError::Ingest(IngestDatasetError::Store(_))
            | DatasetApiError::Ingest(IngestDatasetError::Interrupted(_)) => internal(&self),

            DatasetApiError::Delete(DeleteDatasetError::NotFound(id))
            | DatasetApiError::Get(GetDatasetError::NotFound(id))
            | DatasetApiError::Report(GenerateReportError::NotFound(id)) => not_found(*id),

            DatasetApiError::List(ListDatasetsError::InvalidLimit { .. }) => {
                ErrorResponse::new("VALIDATION_ERROR", self.to_string()).with_status(StatusCode::BAD_REQUEST)
            },

            DatasetApiError::Report(GenerateReportError::Render(_)) => {
                tracing::error!("Report rendering failed: {}", self);
                ErrorResponse::new("REPORT_GENERATION_FAILED", self.to_string())
                    .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            },

            DatasetApiError::Delete(DeleteDatasetError::Store(_))
            | DatasetApiError::List(ListDatasetsError::Store(_))
            | DatasetApiError::Get(GetDatasetError::Store(_))
            | DatasetApiError::Report(GenerateReportError::Store(_))
            | DatasetApiError::Report(GenerateReportError::Interrupted(_)) => internal(&self),
        }
    }
}

impl std::fmt::Display for DatasetApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Multipart(e) => write!(f, "{}", e),
            Self::Ingest(e) => write!(f, "{}", e),
            Self::Delete(e) => write!(f, "{}", e),
            Self::List(e) => write!(f, "{}", e),
            Self::Get(e) => write!(f, "{}", e),
            Self::Report(e) => write!(f, "{}", e),
        }
    }
}
