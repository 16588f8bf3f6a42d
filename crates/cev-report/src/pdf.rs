//! PDF serialization of laid-out pages using the standard Helvetica faces

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Polygon,
    Pt,
};

use crate::document::{FontFace, Rgb};
use crate::error::ReportError;
use crate::layout::{DrawOp, Page, PageGeometry};

const LAYER_NAME: &str = "Content";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn get(&self, face: FontFace) -> &IndirectFontRef {
        match face {
            FontFace::Regular => &self.regular,
            FontFace::Bold => &self.bold,
            FontFace::Oblique => &self.oblique,
        }
    }
}

fn mm(points: f32) -> Mm {
    Mm::from(Pt(points))
}

fn point(x: f32, y: f32) -> Point {
    Point::new(mm(x), mm(y))
}

fn color(rgb: Rgb) -> Color {
    let (r, g, b) = rgb.fractions();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

fn pdf_error<E: std::fmt::Debug>(err: E) -> ReportError {
    ReportError::Pdf(format!("{err:?}"))
}

fn draw(layer: &PdfLayerReference, fonts: &Fonts, op: &DrawOp) {
    match op {
        DrawOp::Text {
            x,
            y,
            text,
            face,
            size,
            color: rgb,
        } => {
            layer.set_fill_color(color(*rgb));
            layer.use_text(text.as_str(), *size, mm(*x), mm(*y), fonts.get(*face));
        }
        DrawOp::FillRect {
            x,
            y,
            width,
            height,
            color: rgb,
        } => {
            layer.set_fill_color(color(*rgb));
            layer.add_polygon(Polygon {
                rings: vec![vec![
                    (point(*x, *y), false),
                    (point(x + width, *y), false),
                    (point(x + width, y + height), false),
                    (point(*x, y + height), false),
                ]],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            });
        }
        DrawOp::Line {
            from,
            to,
            width,
            color: rgb,
        } => {
            layer.set_outline_color(color(*rgb));
            layer.set_outline_thickness(*width);
            layer.add_line(Line {
                points: vec![(point(from.0, from.1), false), (point(to.0, to.1), false)],
                is_closed: false,
            });
        }
    }
}

/// Serialize `pages` into a PDF document.
pub fn write_pdf(title: &str, pages: &[Page], geometry: PageGeometry) -> Result<Vec<u8>, ReportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        mm(geometry.width),
        mm(geometry.height),
        LAYER_NAME,
    );

    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_error)?,
        oblique: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_error)?,
    };

    for (index, page) in pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(mm(geometry.width), mm(geometry.height), LAYER_NAME);
            doc.get_page(page_index).get_layer(layer_index)
        };

        for op in &page.ops {
            draw(&layer, &fonts, op);
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}
