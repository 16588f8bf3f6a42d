//! Shared utilities for feature modules
//!
//! - **principal**: the authenticated-principal extractor
//! - **validation**: upload input validation

pub mod principal;
pub mod validation;

pub use principal::{AuthenticatedPrincipal, PrincipalRejection};
pub use validation::{validate_upload_name, UploadNameError, MAX_DATASET_NAME_LENGTH};
