//! Summary statistics over validated equipment rows
//!
//! A single pass produces the dataset aggregate and one draft per row in input
//! order. Averages are rounded to two decimals; drafts keep the raw values.

use cev_common::EquipmentTypes;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, MalformedRow, ValidationError};
use crate::schema::{RequiredColumns, FLOWRATE, PRESSURE, TEMPERATURE};
use crate::table::TabularPayload;

/// Dataset-level statistics computed from an upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetAggregate {
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub equipment_types: EquipmentTypes,
}

/// One equipment row as read from the upload, before it has an identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentDraft {
    pub name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// Aggregate plus the rows it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub aggregate: DatasetAggregate,
    pub rows: Vec<EquipmentDraft>,
}

/// Round half away from zero to two decimal places.
pub fn round_to_hundredths(value: f64) -> f64 {
    let scaled = value * 100.0;
    // Magnitudes this large carry no fractional digits.
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

// Summing in sorted order makes the result independent of row order.
// A sum that overflows is redone over pre-divided terms.
fn order_independent_mean(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let n = values.len() as f64;
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        sum / n
    } else {
        values.iter().map(|v| v / n).sum()
    }
}

fn parse_measurement(row: usize, column: &str, raw: &str) -> Result<f64, MalformedRow> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MalformedRow {
            row,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Aggregate every row of a schema-checked table.
///
/// # Errors
///
/// - [`ValidationError::Empty`] when the table has no rows
/// - [`MalformedRow`] for the first measurement cell that is not a finite number
pub fn aggregate(
    payload: &TabularPayload,
    columns: &RequiredColumns,
) -> Result<Aggregation, IngestError> {
    if payload.is_empty() {
        return Err(ValidationError::Empty.into());
    }

    let mut rows = Vec::with_capacity(payload.len());
    let mut flowrates = Vec::with_capacity(payload.len());
    let mut pressures = Vec::with_capacity(payload.len());
    let mut temperatures = Vec::with_capacity(payload.len());
    let mut equipment_types = EquipmentTypes::new();

    for (index, cells) in payload.rows().iter().enumerate() {
        let row = index + 1;
        let cell = |position: usize| cells.get(position).map(String::as_str).unwrap_or_default();

        let draft = EquipmentDraft {
            name: cell(columns.name).to_string(),
            equipment_type: cell(columns.equipment_type).to_string(),
            flowrate: parse_measurement(row, FLOWRATE, cell(columns.flowrate))?,
            pressure: parse_measurement(row, PRESSURE, cell(columns.pressure))?,
            temperature: parse_measurement(row, TEMPERATURE, cell(columns.temperature))?,
        };

        flowrates.push(draft.flowrate);
        pressures.push(draft.pressure);
        temperatures.push(draft.temperature);
        *equipment_types.entry(draft.equipment_type.clone()).or_insert(0) += 1;
        rows.push(draft);
    }

    let aggregate = DatasetAggregate {
        total_count: rows.len() as u64,
        avg_flowrate: round_to_hundredths(order_independent_mean(&mut flowrates)),
        avg_pressure: round_to_hundredths(order_independent_mean(&mut pressures)),
        avg_temperature: round_to_hundredths(order_independent_mean(&mut temperatures)),
        equipment_types,
    };

    Ok(Aggregation { aggregate, rows })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::validate_schema;

    const HEADER: &str = "Equipment Name,Type,Flowrate,Pressure,Temperature\n";

    fn run(body: &str) -> Result<Aggregation, IngestError> {
        let payload = TabularPayload::from_csv(format!("{HEADER}{body}").as_bytes())?;
        let columns = validate_schema(payload.columns())?;
        aggregate(&payload, &columns)
    }

    #[test]
    fn test_three_row_example() {
        let result = run("A,Pump,10.0,2.0,25.0\nB,Valve,20.0,4.0,30.0\nC,Pump,30.0,6.0,35.0\n").unwrap();
        let agg = &result.aggregate;

        assert_eq!(agg.total_count, 3);
        assert_eq!(agg.avg_flowrate, 20.0);
        assert_eq!(agg.avg_pressure, 4.0);
        assert_eq!(agg.avg_temperature, 30.0);
        assert_eq!(agg.equipment_types.get("Pump"), Some(&2));
        assert_eq!(agg.equipment_types.get("Valve"), Some(&1));
        assert_eq!(agg.equipment_types.values().sum::<u64>(), agg.total_count);
    }

    #[test]
    fn test_rows_keep_input_order_and_raw_values() {
        let result = run("Z,Pump,1.234,2.345,3.456\nA,Valve,1,2,3\n").unwrap();
        assert_eq!(result.rows[0].name, "Z");
        assert_eq!(result.rows[0].flowrate, 1.234);
        assert_eq!(result.rows[1].name, "A");
        assert_eq!(result.aggregate.avg_flowrate, 1.12);
    }

    #[test]
    fn test_averages_round_to_two_decimals() {
        let result = run("A,Pump,1,1,1\nB,Pump,1,1,1\nC,Pump,2,2,2\n").unwrap();
        assert_eq!(result.aggregate.avg_flowrate, 1.33);
    }

    #[test]
    fn test_mean_of_huge_values_stays_finite() {
        let result = run("A,Pump,1e308,1,1\nB,Pump,1e308,1,1\n").unwrap();
        assert!(result.aggregate.avg_flowrate.is_finite());
        assert_eq!(result.aggregate.avg_flowrate, 1e308);
        assert_eq!(result.aggregate.avg_pressure, 1.0);

        let mixed = run("A,Pump,1e308,1,1\nB,Pump,1e308,1,1\nC,Pump,-1e308,1,1\n").unwrap();
        assert!(mixed.aggregate.avg_flowrate.is_finite());
        assert!((mixed.aggregate.avg_flowrate - 1e308 / 3.0).abs() <= 1e293);
    }

    #[test]
    fn test_row_order_does_not_change_aggregate() {
        let rows = [
            "A,Pump,0.1,1e-3,100.7",
            "B,Valve,0.2,3.3,-40.25",
            "C,Pump,0.3,1e16,12.5",
            "D,Mixer,7.77,-1e16,0.01",
        ];
        let forward = run(&rows.join("\n")).unwrap();
        let mut reversed_rows = rows;
        reversed_rows.reverse();
        let reversed = run(&reversed_rows.join("\n")).unwrap();

        assert_eq!(forward.aggregate, reversed.aggregate);
    }

    #[test]
    fn test_same_input_same_output() {
        let body = "A,Pump,10,2,25\nB,Valve,20,4,30\n";
        assert_eq!(run(body).unwrap(), run(body).unwrap());
    }

    #[test]
    fn test_non_numeric_measurement_identifies_row_and_column() {
        let err = run("A,Pump,10,2,25\nB,Valve,20,high,30\n").unwrap_err();
        assert_eq!(
            err,
            IngestError::MalformedRow(MalformedRow {
                row: 2,
                column: "Pressure".to_string(),
                value: "high".to_string(),
            })
        );
    }

    #[test]
    fn test_empty_and_non_finite_cells_are_malformed() {
        assert!(matches!(run("A,Pump,,2,25\n"), Err(IngestError::MalformedRow(_))));
        assert!(matches!(run("A,Pump,NaN,2,25\n"), Err(IngestError::MalformedRow(_))));
        assert!(matches!(run("A,Pump,1,2,inf\n"), Err(IngestError::MalformedRow(_))));
    }

    #[test]
    fn test_surrounding_whitespace_in_numbers_is_accepted() {
        let result = run("A,Pump, 10 ,2,25\n").unwrap();
        assert_eq!(result.rows[0].flowrate, 10.0);
    }

    #[test]
    fn test_header_only_upload_is_rejected() {
        assert_eq!(run("").unwrap_err(), IngestError::Validation(ValidationError::Empty));
    }

    #[test]
    fn test_type_labels_are_literal() {
        let result = run("A,pump,1,1,1\nB,Pump,1,1,1\n").unwrap();
        assert_eq!(result.aggregate.equipment_types.len(), 2);
    }

    #[test]
    fn test_round_to_hundredths() {
        assert_eq!(round_to_hundredths(2.004), 2.0);
        assert_eq!(round_to_hundredths(-1.236), -1.24);
        assert_eq!(round_to_hundredths(-0.001), 0.0);
        assert_eq!(round_to_hundredths(1e308), 1e308);
    }
}
