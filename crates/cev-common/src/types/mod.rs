//! Common types used across CEV
//!
//! The wire names follow the JSON the web and desktop clients already read
//! (`uploaded_at`, `uploaded_by_username`, `equipment_items`, ...), while the
//! Rust field names describe the data.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category label to occurrence count.
pub type EquipmentTypes = BTreeMap<String, u64>;

/// The authenticated actor behind an upload.
///
/// Datasets only hold the principal's id. The display name is looked up when a
/// dataset is read and is absent once the principal record is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub username: String,
}

impl Principal {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }
}

/// Aggregate record of one ingested upload, without its detail rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "uploaded_at")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "uploaded_by_id", skip_serializing_if = "Option::is_none", default)]
    pub principal_id: Option<String>,
    #[serde(rename = "uploaded_by_username")]
    pub principal_name: Option<String>,
    pub total_count: u64,
    pub avg_flowrate: f64,
    pub avg_pressure: f64,
    pub avg_temperature: f64,
    pub equipment_types: EquipmentTypes,
}

impl DatasetSummary {
    /// Sum of the category counts. Equal to `total_count` for every stored dataset.
    pub fn categorized_count(&self) -> u64 {
        self.equipment_types.values().sum()
    }
}

/// One detail row owned by a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: i64,
    #[serde(rename = "equipment_name")]
    pub name: String,
    pub equipment_type: String,
    pub flowrate: f64,
    pub pressure: f64,
    pub temperature: f64,
}

/// A dataset together with its equipment rows, in upload order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetDetail {
    #[serde(flatten)]
    pub summary: DatasetSummary,
    #[serde(rename = "equipment_items")]
    pub equipment: Vec<Equipment>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn summary() -> DatasetSummary {
        DatasetSummary {
            id: 7,
            name: "plant.csv".to_string(),
            created_at: Utc::now(),
            principal_id: None,
            principal_name: None,
            total_count: 3,
            avg_flowrate: 20.0,
            avg_pressure: 4.0,
            avg_temperature: 30.0,
            equipment_types: BTreeMap::from([("Pump".to_string(), 2), ("Valve".to_string(), 1)]),
        }
    }

    #[test]
    fn test_categorized_count_matches_total() {
        let summary = summary();
        assert_eq!(summary.categorized_count(), summary.total_count);
    }

    #[test]
    fn test_detail_serializes_with_client_field_names() {
        let detail = DatasetDetail {
            summary: summary(),
            equipment: vec![Equipment {
                id: 1,
                name: "A".to_string(),
                equipment_type: "Pump".to_string(),
                flowrate: 10.0,
                pressure: 2.0,
                temperature: 25.0,
            }],
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json["uploaded_at"].is_string());
        assert!(json["uploaded_by_username"].is_null());
        assert!(json.get("uploaded_by_id").is_none());
        assert_eq!(json["equipment_types"]["Pump"], 2);
        assert_eq!(json["equipment_items"][0]["equipment_name"], "A");
    }
}
