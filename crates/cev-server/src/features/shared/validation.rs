//! Upload input validation

use thiserror::Error;

/// Longest accepted dataset name, in characters.
pub const MAX_DATASET_NAME_LENGTH: usize = 255;

const CSV_EXTENSION: &str = ".csv";

/// Errors for an uploaded file's name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UploadNameError {
    #[error("File name is required")]
    Required,

    #[error("File name must be at most {max_length} characters")]
    TooLong { max_length: usize },

    #[error("Only CSV files are allowed")]
    NotCsv,
}

/// Validate the name of an uploaded file
///
/// # Rules
/// - Must not be empty or whitespace
/// - Must not exceed [`MAX_DATASET_NAME_LENGTH`] characters
/// - Must end in `.csv`, in any letter case
pub fn validate_upload_name(name: &str) -> Result<(), UploadNameError> {
    if name.trim().is_empty() {
        return Err(UploadNameError::Required);
    }

    if name.chars().count() > MAX_DATASET_NAME_LENGTH {
        return Err(UploadNameError::TooLong {
            max_length: MAX_DATASET_NAME_LENGTH,
        });
    }

    let has_extension = name
        .len()
        .checked_sub(CSV_EXTENSION.len())
        .filter(|&cut| name.is_char_boundary(cut))
        .is_some_and(|cut| name[cut..].eq_ignore_ascii_case(CSV_EXTENSION));

    if !has_extension {
        return Err(UploadNameError::NotCsv);
    }

    Ok(())
}
