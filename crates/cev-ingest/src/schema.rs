//! Required-column check for equipment uploads
//!
//! Only column presence is checked here. Cell contents are interpreted later
//! by the aggregator, which reports bad numbers per row.

use crate::error::ValidationError;

pub const EQUIPMENT_NAME: &str = "Equipment Name";
pub const TYPE: &str = "Type";
pub const FLOWRATE: &str = "Flowrate";
pub const PRESSURE: &str = "Pressure";
pub const TEMPERATURE: &str = "Temperature";

/// Columns every upload must carry, in the order they are reported when missing.
pub const REQUIRED_COLUMNS: [&str; 5] = [EQUIPMENT_NAME, TYPE, FLOWRATE, PRESSURE, TEMPERATURE];

/// Positions of the required columns within a validated header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequiredColumns {
    pub name: usize,
    pub equipment_type: usize,
    pub flowrate: usize,
    pub pressure: usize,
    pub temperature: usize,
}

/// Locate every required column or report all of the missing ones.
///
/// Extra columns are ignored. When a name repeats, the first occurrence is used.
pub fn validate_schema(columns: &[String]) -> Result<RequiredColumns, ValidationError> {
    let positions = REQUIRED_COLUMNS.map(|wanted| columns.iter().position(|c| c == wanted));

    if let [Some(name), Some(equipment_type), Some(flowrate), Some(pressure), Some(temperature)] =
        positions
    {
        return Ok(RequiredColumns {
            name,
            equipment_type,
            flowrate,
            pressure,
            temperature,
        });
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .zip(positions)
        .filter(|(_, position)| position.is_none())
        .map(|(column, _)| column.to_string())
        .collect();

    tracing::debug!(missing = ?missing, "Upload rejected: required columns absent");
    Err(ValidationError::MissingColumns(missing))
}
