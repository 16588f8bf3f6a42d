//! Styled block model of the report
//!
//! [`build_document`] turns [`ReportContent`] into a flat list of blocks the
//! layout engine flows onto pages. Sizes are in points.

use crate::content::ReportContent;

pub const INCH: f32 = 72.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const fn hex(value: u32) -> Self {
        Self((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    pub fn fractions(self) -> (f32, f32, f32) {
        (
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        )
    }
}

pub const BLACK: Rgb = Rgb(0, 0, 0);
pub const WHITE: Rgb = Rgb(255, 255, 255);
pub const TITLE_COLOR: Rgb = Rgb::hex(0x2C3E50);
pub const HEADING_COLOR: Rgb = Rgb::hex(0x34495E);
pub const MUTED_COLOR: Rgb = Rgb::hex(0x7F8C8D);
pub const GRID_COLOR: Rgb = Rgb::hex(0xCCCCCC);
pub const LABEL_FILL: Rgb = Rgb::hex(0xE8F4F8);
pub const STRIPE_FILL: Rgb = Rgb::hex(0xF7F9FA);
pub const STATS_HEADER: Rgb = Rgb::hex(0x3498DB);
pub const TYPES_HEADER: Rgb = Rgb::hex(0x2ECC71);
pub const DETAILS_HEADER: Rgb = Rgb::hex(0xE74C3C);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFace {
    Regular,
    Bold,
    Oblique,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub face: FontFace,
    pub size: f32,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(face: FontFace, size: f32, color: Rgb) -> Self {
        Self { face, size, color }
    }

    pub fn leading(&self) -> f32 {
        self.size * 1.2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: TextStyle,
    pub align: Align,
    pub space_after: f32,
    /// Start a new page unless some room is left below this paragraph.
    pub keep_with_next: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub width: f32,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TableRow {
    Cells(Vec<String>),
    /// One cell across every column.
    Spanning(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableStyle {
    pub header_fill: Rgb,
    pub header_text: TextStyle,
    pub body_text: TextStyle,
    /// Fill and font of the first column, for label/value tables.
    pub label_column: Option<(Rgb, FontFace)>,
    pub stripe: Option<Rgb>,
    pub padding: f32,
    pub grid: Rgb,
    pub grid_width: f32,
    /// Maximum lines per cell before truncation.
    pub max_lines: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<Column>,
    /// Repeated at the top of every page the table continues on.
    pub header: Option<Vec<String>>,
    pub rows: Vec<TableRow>,
    pub style: TableStyle,
}

impl Table {
    pub fn width(&self) -> f32 {
        self.columns.iter().map(|c| c.width).sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(Paragraph),
    Spacer(f32),
    Table(Table),
}

const TITLE_STYLE: TextStyle = TextStyle::new(FontFace::Bold, 24.0, TITLE_COLOR);
const SUBTITLE_STYLE: TextStyle = TextStyle::new(FontFace::Oblique, 10.0, MUTED_COLOR);
const HEADING_STYLE: TextStyle = TextStyle::new(FontFace::Bold, 16.0, HEADING_COLOR);
const FOOTER_STYLE: TextStyle = TextStyle::new(FontFace::Oblique, 9.0, MUTED_COLOR);

fn heading(text: &str) -> Block {
    Block::Paragraph(Paragraph {
        text: text.to_string(),
        style: HEADING_STYLE,
        align: Align::Left,
        space_after: 12.0,
        keep_with_next: true,
    })
}

fn columns(widths_in: &[f32], aligns: &[Align]) -> Vec<Column> {
    widths_in
        .iter()
        .zip(aligns)
        .map(|(w, &align)| Column {
            width: w * INCH,
            align,
        })
        .collect()
}

fn data_style(header_fill: Rgb) -> TableStyle {
    TableStyle {
        header_fill,
        header_text: TextStyle::new(FontFace::Bold, 12.0, WHITE),
        body_text: TextStyle::new(FontFace::Regular, 11.0, BLACK),
        label_column: None,
        stripe: Some(STRIPE_FILL),
        padding: 6.0,
        grid: GRID_COLOR,
        grid_width: 0.75,
        max_lines: 3,
    }
}

fn information_table(content: &ReportContent) -> Table {
    Table {
        columns: columns(&[2.2, 4.0], &[Align::Left, Align::Left]),
        header: None,
        rows: content
            .information
            .iter()
            .map(|(label, value)| TableRow::Cells(vec![label.to_string(), value.clone()]))
            .collect(),
        style: TableStyle {
            label_column: Some((LABEL_FILL, FontFace::Bold)),
            stripe: None,
            padding: 8.0,
            ..data_style(WHITE)
        },
    }
}

fn statistics_table(content: &ReportContent) -> Table {
    Table {
        columns: columns(&[2.5, 2.0, 1.7], &[Align::Left, Align::Center, Align::Center]),
        header: Some(vec!["Metric".into(), "Value".into(), "Unit".into()]),
        rows: content
            .statistics
            .iter()
            .map(|s| TableRow::Cells(vec![s.metric.to_string(), s.value.clone(), s.unit.to_string()]))
            .collect(),
        style: data_style(STATS_HEADER),
    }
}

fn distribution_table(content: &ReportContent) -> Table {
    Table {
        columns: columns(&[2.5, 2.0, 1.7], &[Align::Left, Align::Center, Align::Center]),
        header: Some(vec!["Equipment Type".into(), "Count".into(), "Percentage".into()]),
        rows: content
            .distribution
            .iter()
            .map(|d| {
                TableRow::Cells(vec![d.label.clone(), d.count.to_string(), d.percentage_label()])
            })
            .collect(),
        style: data_style(TYPES_HEADER),
    }
}

fn details_table(content: &ReportContent) -> Table {
    let mut rows: Vec<TableRow> = content
        .details
        .iter()
        .map(|d| TableRow::Cells(d.cells().iter().map(|c| c.to_string()).collect()))
        .collect();

    if let Some(overflow) = content.overflow {
        rows.push(TableRow::Cells(vec!["...".to_string(); 5]));
        rows.push(TableRow::Spanning(overflow.summary()));
    }

    Table {
        columns: columns(
            &[1.9, 1.4, 1.1, 1.1, 0.7],
            &[Align::Left, Align::Left, Align::Center, Align::Center, Align::Center],
        ),
        header: Some(vec![
            "Equipment Name".into(),
            "Type".into(),
            "Flowrate".into(),
            "Pressure".into(),
            "Temp".into(),
        ]),
        rows,
        style: TableStyle {
            header_text: TextStyle::new(FontFace::Bold, 10.0, WHITE),
            body_text: TextStyle::new(FontFace::Regular, 9.0, BLACK),
            padding: 4.0,
            ..data_style(DETAILS_HEADER)
        },
    }
}

/// Lay out the report sections in reading order.
pub fn build_document(content: &ReportContent) -> Vec<Block> {
    vec![
        Block::Paragraph(Paragraph {
            text: content.title.clone(),
            style: TITLE_STYLE,
            align: Align::Center,
            space_after: 8.0,
            keep_with_next: false,
        }),
        Block::Paragraph(Paragraph {
            text: content.generated_on.clone(),
            style: SUBTITLE_STYLE,
            align: Align::Center,
            space_after: 0.0,
            keep_with_next: false,
        }),
        Block::Spacer(0.3 * INCH),
        heading("Dataset Information"),
        Block::Table(information_table(content)),
        Block::Spacer(0.3 * INCH),
        heading("Summary Statistics"),
        Block::Table(statistics_table(content)),
        Block::Spacer(0.3 * INCH),
        heading("Equipment Type Distribution"),
        Block::Table(distribution_table(content)),
        Block::Spacer(0.3 * INCH),
        heading("Equipment Details"),
        Block::Table(details_table(content)),
        Block::Spacer(0.5 * INCH),
        Block::Paragraph(Paragraph {
            text: content.footer.clone(),
            style: FOOTER_STYLE,
            align: Align::Center,
            space_after: 0.0,
            keep_with_next: false,
        }),
    ]
}
