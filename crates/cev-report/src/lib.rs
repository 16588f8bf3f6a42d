//! CEV Report
//!
//! Paginated PDF reports for ingested equipment datasets.
//!
//! Rendering runs in three steps:
//! - [`content`] derives the report text and figures from a [`DatasetDetail`]
//! - [`document`] arranges them into styled blocks and tables
//! - [`layout`] flows the blocks onto pages, which [`pdf`] serializes
//!
//! Rendering is synchronous and CPU-bound; async callers should run it on a
//! blocking thread.

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod content;
pub mod document;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod pdf;

use cev_common::DatasetDetail;
use chrono::{DateTime, Utc};

pub use content::{ReportContent, DETAIL_ROW_LIMIT};
pub use error::ReportError;
pub use layout::{Page, PageGeometry};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// A rendered report ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub file_name: String,
    pub page_count: usize,
    pub bytes: Vec<u8>,
}

/// Download name for a dataset's report: `report_<stem>.pdf`.
///
/// A trailing `.csv` is dropped. Characters outside `[A-Za-z0-9._-]` become `_`
/// so the name is safe inside a `Content-Disposition` header.
pub fn report_file_name(dataset_name: &str) -> String {
    let stem = match dataset_name.len().checked_sub(4) {
        Some(cut)
            if dataset_name.is_char_boundary(cut)
                && dataset_name[cut..].eq_ignore_ascii_case(".csv") =>
        {
            &dataset_name[..cut]
        }
        _ => dataset_name,
    };

    let safe: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("report_{safe}.pdf")
}

/// Lay out a dataset report without serializing it.
pub fn layout_report(
    detail: &DatasetDetail,
    generated_at: DateTime<Utc>,
    geometry: PageGeometry,
) -> Result<Vec<Page>, ReportError> {
    let content = ReportContent::from_dataset(detail, generated_at);
    let blocks = document::build_document(&content);
    layout::layout(&blocks, geometry)
}

/// Render the PDF report of a dataset on US Letter pages.
#[tracing::instrument(skip(detail), fields(dataset_id = detail.summary.id, rows = detail.equipment.len()))]
pub fn render_report(
    detail: &DatasetDetail,
    generated_at: DateTime<Utc>,
) -> Result<RenderedReport, ReportError> {
    let geometry = PageGeometry::LETTER;
    let pages = layout_report(detail, generated_at, geometry)?;
    let bytes = pdf::write_pdf(content::REPORT_TITLE, &pages, geometry)?;

    tracing::debug!(pages = pages.len(), bytes = bytes.len(), "Report rendered");

    Ok(RenderedReport {
        file_name: report_file_name(&detail.summary.name),
        page_count: pages.len(),
        bytes,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use cev_common::{DatasetSummary, Equipment, EquipmentTypes};
    use chrono::TimeZone;

    fn dataset(rows: usize, types: &[(&str, u64)]) -> DatasetDetail {
        let equipment_types: EquipmentTypes =
            types.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        DatasetDetail {
            summary: DatasetSummary {
                id: 7,
                name: "plant_a.csv".to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
                principal_id: None,
                principal_name: None,
                total_count: rows as u64,
                avg_flowrate: 120.5,
                avg_pressure: 5.25,
                avg_temperature: 98.1,
                equipment_types,
            },
            equipment: (0..rows)
                .map(|i| Equipment {
                    id: i as i64 + 1,
                    name: format!("Unit-{i}"),
                    equipment_type: "Pump".to_string(),
                    flowrate: 100.0 + i as f64,
                    pressure: 5.0,
                    temperature: 98.0,
                })
                .collect(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 15, 45, 0).unwrap()
    }

    fn all_text(pages: &[Page]) -> Vec<String> {
        pages
            .iter()
            .flat_map(|p| p.texts().map(str::to_string).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("plant_a.csv"), "report_plant_a.pdf");
        assert_eq!(report_file_name("PLANT.CSV"), "report_PLANT.pdf");
        assert_eq!(report_file_name("my data.csv"), "report_my_data.pdf");
        assert_eq!(report_file_name("résumé.csv"), "report_r_sum_.pdf");
        assert_eq!(report_file_name("csv"), "report_csv.pdf");
    }

    #[test]
    fn test_render_produces_pdf_bytes() {
        let report = render_report(&dataset(3, &[("Pump", 3)]), now()).unwrap();
        assert!(report.bytes.starts_with(b"%PDF"));
        assert_eq!(report.file_name, "report_plant_a.pdf");
        assert!(report.page_count >= 1);
    }

    #[test]
    fn test_empty_dataset_renders() {
        let detail = dataset(0, &[]);
        let report = render_report(&detail, now()).unwrap();
        assert!(report.bytes.starts_with(b"%PDF"));

        let text = all_text(&layout_report(&detail, now(), PageGeometry::LETTER).unwrap());
        assert!(text.iter().any(|t| t == "Equipment Details"));
        assert!(!text.iter().any(|t| t.starts_with("Unit-")));
        assert!(!text.iter().any(|t| t.starts_with("+ ")));
    }

    #[test]
    fn test_zero_count_categories_show_zero_percent() {
        let detail = dataset(0, &[("Pump", 0), ("Valve", 0)]);
        let text = all_text(&layout_report(&detail, now(), PageGeometry::LETTER).unwrap());
        assert_eq!(text.iter().filter(|t| *t == "0.0%").count(), 2);
    }

    #[test]
    fn test_thirty_rows_show_twenty_five_and_summary() {
        let detail = dataset(30, &[("Pump", 30)]);
        let pages = layout_report(&detail, now(), PageGeometry::LETTER).unwrap();
        let text = all_text(&pages);

        let listed = text.iter().filter(|t| t.starts_with("Unit-")).count();
        assert_eq!(listed, 25);
        assert!(text.iter().any(|t| t == "Unit-24"));
        assert!(!text.iter().any(|t| t == "Unit-25"));
        assert_eq!(text.iter().filter(|t| *t == "...").count(), 5);
        assert!(text.iter().any(|t| t == "+ 5 more items (showing 25 of 30)"));
    }

    #[test]
    fn test_every_page_is_numbered() {
        let detail = dataset(30, &[("Pump", 30)]);
        let pages = layout_report(&detail, now(), PageGeometry::LETTER).unwrap();
        let total = pages.len();
        for (index, page) in pages.iter().enumerate() {
            let expected = format!("Page {} of {}", index + 1, total);
            assert!(page.texts().any(|t| t == expected));
        }
    }

    #[test]
    fn test_header_repeats_when_details_continue() {
        let detail = dataset(30, &[("Pump", 30)]);
        let pages = layout_report(&detail, now(), PageGeometry::LETTER).unwrap();
        assert!(pages.len() > 1);

        let first_unit_page = pages
            .iter()
            .position(|p| p.texts().any(|t| t.starts_with("Unit-")))
            .unwrap();
        for page in &pages[first_unit_page..] {
            if page.texts().any(|t| t.starts_with("Unit-")) {
                assert!(page.texts().any(|t| t == "Temp"));
            }
        }
    }

    #[test]
    fn test_long_values_are_truncated_not_rejected() {
        let mut detail = dataset(2, &[("Pump", 2)]);
        detail.equipment[0].name = "Very long equipment name ".repeat(20);
        detail.summary.name = "x".repeat(250);

        let pages = layout_report(&detail, now(), PageGeometry::LETTER).unwrap();
        let text = all_text(&pages);
        assert!(text.iter().any(|t| t.starts_with("Very")));
        assert!(text.iter().any(|t| t.ends_with("...") && t.len() > 3));
        assert!(!text.iter().any(|t| t.len() > 200));
        assert!(render_report(&detail, now()).is_ok());
    }

    #[test]
    fn test_layout_is_deterministic() {
        let detail = dataset(30, &[("Pump", 20), ("Valve", 10)]);
        assert_eq!(
            layout_report(&detail, now(), PageGeometry::LETTER).unwrap(),
            layout_report(&detail, now(), PageGeometry::LETTER).unwrap()
        );
    }

    #[test]
    fn test_footer_and_title_present() {
        let text = all_text(&layout_report(&dataset(1, &[("Pump", 1)]), now(), PageGeometry::LETTER).unwrap());
        assert_eq!(text[0], content::REPORT_TITLE);
        assert!(text.iter().any(|t| t == "N/A"));
        assert!(text.iter().any(|t| t.starts_with("This report was automatically generated")));
    }
}
