//! Page layout
//!
//! Blocks are flowed top to bottom into the frame of each page. Tables break
//! between rows and repeat their header on the continuation page. Once every
//! block is placed, each page gets a "Page i of n" folio.
//!
//! Coordinates are PDF points with the origin at the bottom left.

use crate::document::{
    Align, Block, FontFace, Paragraph, Rgb, Table, TableRow, TextStyle, MUTED_COLOR,
};
use crate::error::ReportError;
use crate::metrics::{text_width, wrap};

/// Page size and margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
}

impl PageGeometry {
    /// US Letter with one-inch side and top margins.
    pub const LETTER: Self = Self {
        width: 612.0,
        height: 792.0,
        margin_left: 72.0,
        margin_right: 72.0,
        margin_top: 72.0,
        margin_bottom: 50.0,
    };

    pub fn frame_width(&self) -> f32 {
        self.width - self.margin_left - self.margin_right
    }

    pub fn frame_top(&self) -> f32 {
        self.height - self.margin_top
    }

    pub fn frame_height(&self) -> f32 {
        self.frame_top() - self.margin_bottom
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::LETTER
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    /// `y` is the text baseline.
    Text {
        x: f32,
        y: f32,
        text: String,
        face: FontFace,
        size: f32,
        color: Rgb,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
        color: Rgb,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text drawn on this page, in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

const FOLIO_STYLE: TextStyle = TextStyle::new(FontFace::Regular, 8.0, MUTED_COLOR);
const FOLIO_BASELINE: f32 = 25.0;
/// Room a keep-with-next paragraph needs below it to stay on the page.
const KEEP_WITH_NEXT_RESERVE: f32 = 60.0;
/// Baseline offset below the top of a line box, as a fraction of font size.
const ASCENT: f32 = 0.9;

struct LaidRow {
    height: f32,
    cells: Vec<LaidCell>,
}

struct LaidCell {
    x: f32,
    width: f32,
    lines: Vec<String>,
    style: TextStyle,
    align: Align,
    fill: Option<Rgb>,
}

#[derive(Clone, Copy)]
enum RowKind {
    Header,
    Body,
}

struct Flow {
    geometry: PageGeometry,
    pages: Vec<Page>,
    current: Page,
    cursor: f32,
}

impl Flow {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: Vec::new(),
            current: Page::default(),
            cursor: geometry.frame_top(),
        }
    }

    fn remaining(&self) -> f32 {
        self.cursor - self.geometry.margin_bottom
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= self.geometry.frame_top()
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.cursor = self.geometry.frame_top();
    }

    fn push(&mut self, op: DrawOp) {
        self.current.ops.push(op);
    }

    fn text(&mut self, x: f32, y: f32, text: String, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.push(DrawOp::Text {
            x,
            y,
            text,
            face: style.face,
            size: style.size,
            color: style.color,
        });
    }

    fn aligned_x(left: f32, width: f32, text: &str, style: TextStyle, align: Align) -> f32 {
        let used = text_width(text, style.face, style.size);
        match align {
            Align::Left => left,
            Align::Center => left + (width - used) / 2.0,
            Align::Right => left + width - used,
        }
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        let width = self.geometry.frame_width();
        let style = paragraph.style;
        let lines = wrap(&paragraph.text, style.face, style.size, width, 0);

        let mut needed = lines.len() as f32 * style.leading();
        if paragraph.keep_with_next {
            needed += KEEP_WITH_NEXT_RESERVE;
        }
        if needed > self.remaining() && !self.at_page_top() {
            self.new_page();
        }

        let left = self.geometry.margin_left;
        for line in lines {
            if style.leading() > self.remaining() && !self.at_page_top() {
                self.new_page();
            }
            let baseline = self.cursor - style.size * ASCENT;
            let x = Self::aligned_x(left, width, &line, style, paragraph.align);
            self.text(x, baseline, line, style);
            self.cursor -= style.leading();
        }
        self.cursor -= paragraph.space_after;
    }

    fn spacer(&mut self, height: f32) {
        if height >= self.remaining() {
            self.new_page();
        } else if !self.at_page_top() {
            self.cursor -= height;
        }
    }

    fn lay_row(table: &Table, left: f32, row: &TableRow, kind: RowKind, index: usize) -> LaidRow {
        let style = &table.style;
        let pad = style.padding;

        let body_fill = match (kind, style.stripe) {
            (RowKind::Header, _) => Some(style.header_fill),
            (RowKind::Body, Some(stripe)) if index % 2 == 1 => Some(stripe),
            _ => None,
        };
        let text_style = match kind {
            RowKind::Header => style.header_text,
            RowKind::Body => style.body_text,
        };

        let cells: Vec<LaidCell> = match row {
            TableRow::Cells(values) => {
                let mut x = left;
                table
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(column_index, column)| {
                        let mut cell_style = text_style;
                        let mut fill = body_fill;
                        if let (RowKind::Body, 0, Some((label_fill, face))) =
                            (kind, column_index, style.label_column)
                        {
                            fill = Some(label_fill);
                            cell_style.face = face;
                        }
                        let value = values.get(column_index).map(String::as_str).unwrap_or_default();
                        let lines = wrap(
                            value,
                            cell_style.face,
                            cell_style.size,
                            column.width - 2.0 * pad,
                            style.max_lines,
                        );
                        let cell = LaidCell {
                            x,
                            width: column.width,
                            lines,
                            style: cell_style,
                            align: column.align,
                            fill,
                        };
                        x += column.width;
                        cell
                    })
                    .collect()
            }
            TableRow::Spanning(value) => {
                let width = table.width();
                vec![LaidCell {
                    x: left,
                    width,
                    lines: wrap(value, text_style.face, text_style.size, width - 2.0 * pad, style.max_lines),
                    style: text_style,
                    align: Align::Center,
                    fill: body_fill,
                }]
            }
        };

        let tallest = cells
            .iter()
            .map(|c| c.lines.len() as f32 * c.style.leading())
            .fold(0.0_f32, f32::max);

        LaidRow {
            height: tallest + 2.0 * pad,
            cells,
        }
    }

    fn draw_row(&mut self, table: &Table, row: &LaidRow) {
        let style = &table.style;
        let top = self.cursor;
        let bottom = top - row.height;
        let pad = style.padding;

        for cell in &row.cells {
            if let Some(color) = cell.fill {
                self.push(DrawOp::FillRect {
                    x: cell.x,
                    y: bottom,
                    width: cell.width,
                    height: row.height,
                    color,
                });
            }

            let block = cell.lines.len() as f32 * cell.style.leading();
            let mut line_top = top - (row.height - block) / 2.0;
            for line in &cell.lines {
                let baseline = line_top - cell.style.size * ASCENT;
                let x = Self::aligned_x(cell.x + pad, cell.width - 2.0 * pad, line, cell.style, cell.align);
                self.text(x, baseline, line.clone(), cell.style);
                line_top -= cell.style.leading();
            }
        }

        let stroke = |from: (f32, f32), to: (f32, f32)| DrawOp::Line {
            from,
            to,
            width: style.grid_width,
            color: style.grid,
        };
        if let (Some(first), Some(last)) = (row.cells.first(), row.cells.last()) {
            let right = last.x + last.width;
            self.push(stroke((first.x, top), (right, top)));
            self.push(stroke((first.x, bottom), (right, bottom)));
            for cell in &row.cells {
                self.push(stroke((cell.x, top), (cell.x, bottom)));
            }
            self.push(stroke((right, top), (right, bottom)));
        }

        self.cursor = bottom;
    }

    fn table(&mut self, table: &Table) -> Result<(), ReportError> {
        let frame_width = self.geometry.frame_width();
        if table.width() > frame_width + 0.01 {
            return Err(ReportError::Layout(format!(
                "table is {:.1}pt wide but the frame is {:.1}pt",
                table.width(),
                frame_width
            )));
        }
        let left = self.geometry.margin_left + (frame_width - table.width()) / 2.0;

        let header = table
            .header
            .as_ref()
            .map(|cells| Self::lay_row(table, left, &TableRow::Cells(cells.clone()), RowKind::Header, 0));
        let header_height = header.as_ref().map_or(0.0, |h| h.height);

        let rows: Vec<LaidRow> = table
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| Self::lay_row(table, left, row, RowKind::Body, index))
            .collect();

        let first_height = rows.first().map_or(0.0, |r| r.height);
        if header_height + first_height > self.geometry.frame_height() {
            return Err(ReportError::Layout(
                "table header and first row do not fit on one page".to_string(),
            ));
        }
        if header_height + first_height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }
        if let Some(header) = &header {
            self.draw_row(table, header);
        }

        for row in &rows {
            if row.height > self.remaining() {
                self.new_page();
                if let Some(header) = &header {
                    self.draw_row(table, header);
                }
            }
            self.draw_row(table, row);
        }
        Ok(())
    }

    fn finish(mut self) -> Vec<Page> {
        if !self.current.ops.is_empty() || self.pages.is_empty() {
            self.pages.push(self.current);
        }

        let total = self.pages.len();
        let center = self.geometry.width / 2.0;
        for (index, page) in self.pages.iter_mut().enumerate() {
            let text = format!("Page {} of {}", index + 1, total);
            let width = text_width(&text, FOLIO_STYLE.face, FOLIO_STYLE.size);
            page.ops.push(DrawOp::Text {
                x: center - width / 2.0,
                y: FOLIO_BASELINE,
                text,
                face: FOLIO_STYLE.face,
                size: FOLIO_STYLE.size,
                color: FOLIO_STYLE.color,
            });
        }
        self.pages
    }
}

/// Flow `blocks` onto as many pages as they need.
pub fn layout(blocks: &[Block], geometry: PageGeometry) -> Result<Vec<Page>, ReportError> {
    if geometry.frame_width() <= 0.0 || geometry.frame_height() <= 0.0 {
        return Err(ReportError::Layout(format!(
            "page {}x{} leaves no room inside its margins",
            geometry.width, geometry.height
        )));
    }

    let mut flow = Flow::new(geometry);
    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => flow.paragraph(paragraph),
            Block::Spacer(height) => flow.spacer(*height),
            Block::Table(table) => flow.table(table)?,
        }
    }
    Ok(flow.finish())
}
