//! PDF serialization of a laid-out report using the built-in Helvetica faces.

use std::io::{BufWriter, Write};

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
    Rgb as PdfRgb,
};

use crate::errors::ReportError;
use crate::report::font_metrics::FontFace;
use crate::report::layout::{DocumentLayout, PlacedItem, Rgb};

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn color(rgb: Rgb) -> Color {
    Color::Rgb(PdfRgb::new(rgb.0, rgb.1, rgb.2, None))
}

fn render_failure(e: impl std::fmt::Display) -> ReportError {
    ReportError::Render {
        message: e.to_string(),
    }
}

/// Writes `layout` as a PDF document titled `title` into `target`.
pub fn write_pdf<W: Write>(
    layout: &DocumentLayout,
    title: &str,
    target: &mut BufWriter<W>,
) -> Result<(), ReportError> {
    let width = mm(layout.width_pt);
    let height = mm(layout.height_pt);

    let (doc, first_page, first_layer) = PdfDocument::new(title, width, height, "content");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_failure)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_failure)?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_ref, layer_ref) = doc.add_page(width, height, "content");
            doc.get_page(page_ref).get_layer(layer_ref)
        };

        for item in &page.items {
            draw_item(&layer, item, &regular, &bold);
        }
    }

    doc.save(target).map_err(render_failure)
}

fn draw_item(
    layer: &PdfLayerReference,
    item: &PlacedItem,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    match item {
        PlacedItem::Text(text) => {
            let font = match text.face {
                FontFace::Regular => regular,
                FontFace::Bold => bold,
            };
            layer.set_fill_color(color(text.color));
            layer.use_text(
                text.text.as_str(),
                text.size_pt,
                mm(text.x_pt),
                mm(text.y_pt),
                font,
            );
        }
        PlacedItem::Rule(rule) => {
            layer.set_outline_color(color(rule.color));
            layer.set_outline_thickness(rule.thickness_pt);
            layer.add_line(Line {
                points: vec![
                    (Point::new(mm(rule.x1_pt), mm(rule.y_pt)), false),
                    (Point::new(mm(rule.x2_pt), mm(rule.y_pt)), false),
                ],
                is_closed: false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, EvaluationRecord};
    use crate::report::document::render_report;
    use crate::report::layout::{layout_document, PageGeometry};

    #[test]
    fn test_write_pdf_produces_pdf_bytes() {
        let analysis = AnalysisResult {
            questions: vec![EvaluationRecord {
                question: "Explain lifetimes".to_string(),
                answer: "They bound how long references are valid.".to_string(),
                feedback: "Accurate.".to_string(),
                score_raw: "9/10".to_string(),
                suggestion: "Mention elision.".to_string(),
            }],
            ..AnalysisResult::default()
        };
        let doc = render_report(&analysis, None, Some("candidate"));
        let layout = layout_document(&doc, &PageGeometry::default());

        let mut writer = BufWriter::new(Vec::new());
        write_pdf(&layout, "Interview Feedback", &mut writer).unwrap();
        let bytes = writer.into_inner().unwrap();

        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 200);
    }
}
