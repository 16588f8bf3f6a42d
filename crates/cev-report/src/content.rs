//! Report content derived from a stored dataset
//!
//! Everything the PDF shows is computed here as plain strings and numbers, so
//! the wording can be checked without looking at page geometry.

use cev_common::{DatasetDetail, Equipment};
use chrono::{DateTime, Utc};

pub const REPORT_TITLE: &str = "Chemical Equipment Analysis Report";
pub const FOOTER_TEXT: &str =
    "This report was automatically generated by the Chemical Equipment Visualizer System.";
pub const NOT_AVAILABLE: &str = "N/A";

/// Maximum number of equipment rows listed individually.
pub const DETAIL_ROW_LIMIT: usize = 25;

const GENERATED_FORMAT: &str = "%B %d, %Y at %I:%M %p UTC";
const UPLOADED_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticLine {
    pub metric: &'static str,
    pub value: String,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DistributionLine {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
}

impl DistributionLine {
    pub fn percentage_label(&self) -> String {
        format!("{:.1}%", self.percentage)
    }
}

/// Equipment rows beyond [`DETAIL_ROW_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailOverflow {
    pub shown: usize,
    pub total: usize,
}

impl DetailOverflow {
    pub fn remaining(&self) -> usize {
        self.total - self.shown
    }

    pub fn summary(&self) -> String {
        format!(
            "+ {} more items (showing {} of {})",
            self.remaining(),
            self.shown,
            self.total
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailLine {
    pub name: String,
    pub equipment_type: String,
    pub flowrate: String,
    pub pressure: String,
    pub temperature: String,
}

impl DetailLine {
    fn from_equipment(item: &Equipment) -> Self {
        Self {
            name: item.name.clone(),
            equipment_type: item.equipment_type.clone(),
            flowrate: format!("{:.2}", item.flowrate),
            pressure: format!("{:.2}", item.pressure),
            temperature: format!("{:.2}", item.temperature),
        }
    }

    pub fn cells(&self) -> [&str; 5] {
        [
            &self.name,
            &self.equipment_type,
            &self.flowrate,
            &self.pressure,
            &self.temperature,
        ]
    }
}

/// All text and figures of one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContent {
    pub title: String,
    pub generated_on: String,
    pub information: Vec<(&'static str, String)>,
    pub statistics: Vec<StatisticLine>,
    pub distribution: Vec<DistributionLine>,
    pub details: Vec<DetailLine>,
    pub overflow: Option<DetailOverflow>,
    pub footer: String,
}

impl ReportContent {
    pub fn from_dataset(detail: &DatasetDetail, generated_at: DateTime<Utc>) -> Self {
        let summary = &detail.summary;

        let uploaded_by = summary
            .principal_name
            .clone()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let information = vec![
            ("Dataset Name:", summary.name.clone()),
            (
                "Upload Date:",
                summary.created_at.format(UPLOADED_FORMAT).to_string(),
            ),
            ("Uploaded By:", uploaded_by),
            ("Total Equipment:", summary.total_count.to_string()),
        ];

        let statistics = vec![
            StatisticLine {
                metric: "Average Flowrate",
                value: format!("{:.2}", summary.avg_flowrate),
                unit: "L/min",
            },
            StatisticLine {
                metric: "Average Pressure",
                value: format!("{:.2}", summary.avg_pressure),
                unit: "bar",
            },
            StatisticLine {
                metric: "Average Temperature",
                value: format!("{:.2}", summary.avg_temperature),
                unit: "°C",
            },
        ];

        let shown = detail.equipment.len().min(DETAIL_ROW_LIMIT);
        let details = detail.equipment[..shown]
            .iter()
            .map(DetailLine::from_equipment)
            .collect();
        let overflow = (detail.equipment.len() > DETAIL_ROW_LIMIT).then(|| DetailOverflow {
            shown,
            total: detail.equipment.len(),
        });

        Self {
            title: REPORT_TITLE.to_string(),
            generated_on: format!("Generated on {}", generated_at.format(GENERATED_FORMAT)),
            information,
            statistics,
            distribution: distribution(summary),
            details,
            overflow,
            footer: FOOTER_TEXT.to_string(),
        }
    }
}

/// Type counts ordered by count descending, then label ascending.
fn distribution(summary: &cev_common::DatasetSummary) -> Vec<DistributionLine> {
    let total: u64 = summary.categorized_count();

    let mut lines: Vec<DistributionLine> = summary
        .equipment_types
        .iter()
        .map(|(label, &count)| DistributionLine {
            label: label.clone(),
            count,
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64 * 100.0
            },
        })
        .collect();

    lines.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    lines
}
