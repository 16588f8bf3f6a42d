pub mod get;
pub mod list;
pub mod report;
pub mod summary;

pub use get::{GetDatasetError, GetDatasetQuery};
pub use list::{ListDatasetsError, ListDatasetsQuery, ListDatasetsResponse};
pub use report::{GenerateReportError, GenerateReportQuery, GenerateReportResponse};
pub use summary::GetDatasetSummaryQuery;
