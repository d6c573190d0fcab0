//! Page layout — wraps and paginates a `ReportDocument` into positioned text runs.
//!
//! Greedy word-wrap on static font metrics; no shaping engine. All coordinates are PDF
//! points measured from the bottom-left corner.

use crate::report::document::{Block, ReportDocument, TextStyle};
use crate::report::font_metrics::{get_metrics, FontFace, FontMetricTable};

// ────────────────────────────────────────────────────────────────────────────
// Page geometry and styles
// ────────────────────────────────────────────────────────────────────────────

/// Page size and margins in points.
#[derive(Debug, Clone)]
pub struct PageGeometry {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin_left_pt: f32,
    pub margin_right_pt: f32,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
}

impl Default for PageGeometry {
    /// A4 portrait, 40pt side margins, 60pt top and bottom.
    fn default() -> Self {
        Self {
            width_pt: 595.28,
            height_pt: 841.89,
            margin_left_pt: 40.0,
            margin_right_pt: 40.0,
            margin_top_pt: 60.0,
            margin_bottom_pt: 60.0,
        }
    }
}

impl PageGeometry {
    pub fn content_width(&self) -> f32 {
        self.width_pt - self.margin_left_pt - self.margin_right_pt
    }

    fn content_bottom(&self) -> f32 {
        self.height_pt - self.margin_bottom_pt
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    const fn hex(rgb: u32) -> Self {
        Rgb(
            ((rgb >> 16) & 0xff) as f32 / 255.0,
            ((rgb >> 8) & 0xff) as f32 / 255.0,
            (rgb & 0xff) as f32 / 255.0,
        )
    }
}

const INK: Rgb = Rgb::hex(0x0f172a);
const SLATE: Rgb = Rgb::hex(0x334155);
const BLUE: Rgb = Rgb::hex(0x1d4ed8);
const INDIGO: Rgb = Rgb::hex(0x4338ca);
const ACCENT: Rgb = Rgb::hex(0x4f46e5);
const GREEN: Rgb = Rgb::hex(0x15803d);
const GREY: Rgb = Rgb::hex(0x9ca3af);
const BODY: Rgb = Rgb::hex(0x1f2937);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy)]
struct StyleSpec {
    face: FontFace,
    size_pt: f32,
    leading_pt: f32,
    color: Rgb,
    align: Align,
    indent_pt: f32,
    space_before_pt: f32,
    space_after_pt: f32,
}

fn style_spec(style: TextStyle) -> StyleSpec {
    let base = StyleSpec {
        face: FontFace::Regular,
        size_pt: 11.0,
        leading_pt: 14.0,
        color: BODY,
        align: Align::Left,
        indent_pt: 0.0,
        space_before_pt: 0.0,
        space_after_pt: 4.0,
    };
    match style {
        TextStyle::Heading => StyleSpec {
            face: FontFace::Bold,
            size_pt: 18.0,
            leading_pt: 22.0,
            color: INK,
            space_after_pt: 14.0,
            ..base
        },
        TextStyle::Subtitle => StyleSpec {
            color: SLATE,
            space_after_pt: 8.0,
            ..base
        },
        TextStyle::SectionTitle => StyleSpec {
            face: FontFace::Bold,
            size_pt: 14.0,
            leading_pt: 18.0,
            color: BLUE,
            space_after_pt: 6.0,
            ..base
        },
        TextStyle::Label => StyleSpec {
            color: SLATE,
            ..base
        },
        TextStyle::Card => StyleSpec {
            leading_pt: 16.0,
            indent_pt: 6.0,
            space_before_pt: 6.0,
            space_after_pt: 10.0,
            ..base
        },
        TextStyle::FinalScore => StyleSpec {
            face: FontFace::Bold,
            size_pt: 20.0,
            leading_pt: 24.0,
            color: INDIGO,
            align: Align::Center,
            space_before_pt: 20.0,
            space_after_pt: 12.0,
            ..base
        },
        TextStyle::Highlight => StyleSpec {
            face: FontFace::Bold,
            size_pt: 16.0,
            leading_pt: 20.0,
            color: GREEN,
            align: Align::Center,
            ..base
        },
    }
}

const TABLE_COLUMNS_PT: [f32; 2] = [350.0, 100.0];
const TABLE_CELL_PADDING_PT: f32 = 4.0;
const TABLE_FONT_PT: f32 = 11.0;
const TABLE_LEADING_PT: f32 = 14.0;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x_pt: f32,
    /// Baseline height above the bottom edge.
    pub y_pt: f32,
    pub face: FontFace,
    pub size_pt: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedRule {
    pub x1_pt: f32,
    pub x2_pt: f32,
    pub y_pt: f32,
    pub thickness_pt: f32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlacedItem {
    Text(PlacedText),
    Rule(PlacedRule),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LaidOutPage {
    pub items: Vec<PlacedItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLayout {
    pub width_pt: f32,
    pub height_pt: f32,
    /// Never empty: a document always has at least one page.
    pub pages: Vec<LaidOutPage>,
}

impl DocumentLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[cfg(test)]
impl DocumentLayout {
    /// All text runs in reading order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(|p| {
            p.items.iter().filter_map(|item| match item {
                PlacedItem::Text(t) => Some(t.text.as_str()),
                PlacedItem::Rule(_) => None,
            })
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layout engine
// ────────────────────────────────────────────────────────────────────────────

struct Cursor<'a> {
    geometry: &'a PageGeometry,
    pages: Vec<LaidOutPage>,
    /// Distance from the top edge of the current page.
    offset_pt: f32,
}

impl<'a> Cursor<'a> {
    fn new(geometry: &'a PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![LaidOutPage::default()],
            offset_pt: geometry.margin_top_pt,
        }
    }

    fn current(&mut self) -> &mut LaidOutPage {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn page_is_empty(&self) -> bool {
        self.pages.last().map_or(true, |p| p.items.is_empty())
    }

    fn new_page(&mut self) {
        self.pages.push(LaidOutPage::default());
        self.offset_pt = self.geometry.margin_top_pt;
    }

    /// Starts a new page unless `height` still fits on the current one.
    fn reserve(&mut self, height_pt: f32) {
        if self.offset_pt + height_pt > self.geometry.content_bottom() && !self.page_is_empty() {
            self.new_page();
        }
    }

    fn advance(&mut self, height_pt: f32) {
        self.offset_pt += height_pt;
    }

    fn baseline(&self, leading_pt: f32, size_pt: f32) -> f32 {
        // Baseline sits one font size below the line top, centred in the leading.
        let top = self.offset_pt + (leading_pt - size_pt) / 2.0;
        self.geometry.height_pt - (top + size_pt * 0.8)
    }
}

/// Wraps and paginates `document` onto pages of the given geometry.
pub fn layout_document(document: &ReportDocument, geometry: &PageGeometry) -> DocumentLayout {
    let mut cursor = Cursor::new(geometry);

    for block in document.blocks() {
        match block {
            Block::Text { style, text } => place_text(&mut cursor, style_spec(*style), text),
            Block::Rule => {
                cursor.reserve(6.0);
                let y = geometry.height_pt - (cursor.offset_pt + 2.0);
                cursor.current().items.push(PlacedItem::Rule(PlacedRule {
                    x1_pt: geometry.margin_left_pt,
                    x2_pt: geometry.width_pt - geometry.margin_right_pt,
                    y_pt: y,
                    thickness_pt: 1.0,
                    color: ACCENT,
                }));
                cursor.advance(6.0);
            }
            Block::Spacer { height_pt } => cursor.advance(*height_pt),
            Block::PageBreak => {
                if !cursor.page_is_empty() {
                    cursor.new_page();
                }
            }
            Block::Table { header, rows } => {
                place_table_row(&mut cursor, header, FontFace::Bold, ACCENT);
                for row in rows {
                    place_table_row(&mut cursor, row, FontFace::Regular, BODY);
                }
                cursor.advance(8.0);
            }
        }
    }

    DocumentLayout {
        width_pt: geometry.width_pt,
        height_pt: geometry.height_pt,
        pages: cursor.pages,
    }
}

fn place_text(cursor: &mut Cursor<'_>, spec: StyleSpec, text: &str) {
    let geometry = cursor.geometry;
    let metrics = get_metrics(spec.face);
    let max_width = geometry.content_width() - 2.0 * spec.indent_pt;
    let lines = wrap_text(&pdf_safe_text(text), metrics, spec.size_pt, max_width);

    cursor.advance(spec.space_before_pt);
    for line in lines {
        cursor.reserve(spec.leading_pt);
        let x = match spec.align {
            Align::Left => geometry.margin_left_pt + spec.indent_pt,
            Align::Center => {
                let width = metrics.measure_pt(&line, spec.size_pt);
                geometry.margin_left_pt + ((geometry.content_width() - width) / 2.0).max(0.0)
            }
        };
        let y = cursor.baseline(spec.leading_pt, spec.size_pt);
        cursor.current().items.push(PlacedItem::Text(PlacedText {
            text: line,
            x_pt: x,
            y_pt: y,
            face: spec.face,
            size_pt: spec.size_pt,
            color: spec.color,
        }));
        cursor.advance(spec.leading_pt);
    }
    cursor.advance(spec.space_after_pt);
}

/// Places one two-column table row; the row moves to a new page as a whole.
fn place_table_row(cursor: &mut Cursor<'_>, cells: &[String; 2], face: FontFace, color: Rgb) {
    let geometry = cursor.geometry;
    let metrics = get_metrics(face);

    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(TABLE_COLUMNS_PT)
        .map(|(cell, width)| {
            wrap_text(
                &pdf_safe_text(cell),
                metrics,
                TABLE_FONT_PT,
                width - 2.0 * TABLE_CELL_PADDING_PT,
            )
        })
        .collect();
    let line_count = wrapped.iter().map(Vec::len).max().unwrap_or(0).max(1);
    let row_height = line_count as f32 * TABLE_LEADING_PT + 2.0 * TABLE_CELL_PADDING_PT;

    cursor.reserve(row_height);
    let row_top = cursor.offset_pt;
    let mut column_x = geometry.margin_left_pt;

    for (column, lines) in wrapped.into_iter().enumerate() {
        cursor.offset_pt = row_top + TABLE_CELL_PADDING_PT;
        for line in lines {
            let y = cursor.baseline(TABLE_LEADING_PT, TABLE_FONT_PT);
            cursor.current().items.push(PlacedItem::Text(PlacedText {
                text: line,
                x_pt: column_x + TABLE_CELL_PADDING_PT,
                y_pt: y,
                face,
                size_pt: TABLE_FONT_PT,
                color,
            }));
            cursor.advance(TABLE_LEADING_PT);
        }
        column_x += TABLE_COLUMNS_PT[column];
    }

    cursor.offset_pt = row_top + row_height;
    let y = geometry.height_pt - cursor.offset_pt;
    cursor.current().items.push(PlacedItem::Rule(PlacedRule {
        x1_pt: geometry.margin_left_pt,
        x2_pt: geometry.margin_left_pt + TABLE_COLUMNS_PT.iter().sum::<f32>(),
        y_pt: y,
        thickness_pt: 0.25,
        color: GREY,
    }));
}

// ────────────────────────────────────────────────────────────────────────────
// Text helpers
// ────────────────────────────────────────────────────────────────────────────

/// Greedy word-wrap of `text` into lines no wider than `max_width_pt`.
///
/// Explicit newlines start new lines. Words wider than a full line are split by
/// character. Blank input yields no lines.
pub fn wrap_text(
    text: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width_pt: f32,
) -> Vec<String> {
    let max_width = max_width_pt / size_pt;
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            for piece in split_long_word(word, metrics, max_width) {
                let word_w = metrics.measure_str(&piece);
                if current.is_empty() {
                    current_width = word_w;
                    current = piece;
                } else if current_width + metrics.space_width + word_w > max_width {
                    lines.push(std::mem::take(&mut current));
                    current_width = word_w;
                    current = piece;
                } else {
                    current_width += metrics.space_width + word_w;
                    current.push(' ');
                    current.push_str(&piece);
                }
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

fn split_long_word(word: &str, metrics: &FontMetricTable, max_width: f32) -> Vec<String> {
    if metrics.measure_str(word) <= max_width {
        return vec![word.to_string()];
    }

    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;
    let mut buf = [0u8; 4];
    for c in word.chars() {
        let char_w = metrics.measure_str(c.encode_utf8(&mut buf));
        if !piece.is_empty() && width + char_w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += char_w;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Maps text onto the Latin-1 range the built-in PDF fonts can encode.
pub fn pdf_safe_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\t' => out.push(' '),
            '\n' => out.push('\n'),
            c if c.is_control() => {}
            c if (c as u32) < 0x7F || (0xA0..=0xFF).contains(&(c as u32)) => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, EvaluationRecord};
    use crate::report::document::render_report;

    fn regular() -> &'static FontMetricTable {
        get_metrics(FontFace::Regular)
    }

    fn analysis_with(n: usize, answer: &str) -> AnalysisResult {
        AnalysisResult {
            questions: (0..n)
                .map(|i| EvaluationRecord {
                    question: format!("Question number {}", i + 1),
                    answer: answer.to_string(),
                    feedback: "Clear and correct.".to_string(),
                    score_raw: "8/10".to_string(),
                    suggestion: "Add an example.".to_string(),
                })
                .collect(),
            ..AnalysisResult::default()
        }
    }

    #[test]
    fn test_wrap_text_empty_returns_no_lines() {
        assert!(wrap_text("", regular(), 11.0, 500.0).is_empty());
        assert!(wrap_text("   ", regular(), 11.0, 500.0).is_empty());
    }

    #[test]
    fn test_wrap_text_short_is_one_line() {
        let lines = wrap_text("Ownership and borrowing", regular(), 11.0, 500.0);
        assert_eq!(lines, vec!["Ownership and borrowing".to_string()]);
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "word ".repeat(200);
        let lines = wrap_text(&text, regular(), 11.0, 300.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(regular().measure_pt(line, 11.0) <= 300.0 + 1e-3);
        }
        let rejoined = lines.join(" ");
        assert_eq!(rejoined.split_whitespace().count(), 200);
    }

    #[test]
    fn test_wrap_text_splits_long_words() {
        let long = "x".repeat(500);
        let lines = wrap_text(&long, regular(), 11.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat().len(), 500);
    }

    #[test]
    fn test_wrap_text_keeps_newlines() {
        let lines = wrap_text("first\nsecond", regular(), 11.0, 500.0);
        assert_eq!(lines, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_pdf_safe_text_maps_typography() {
        assert_eq!(pdf_safe_text("it\u{2019}s \u{201C}ok\u{201D} \u{2014} fine\u{2026}"), "it's \"ok\" - fine...");
        assert_eq!(pdf_safe_text("caf\u{e9}"), "caf\u{e9}");
        assert_eq!(pdf_safe_text("\u{1F4C4} report"), "? report");
    }

    #[test]
    fn test_title_only_document_is_one_page() {
        let doc = render_report(&AnalysisResult::default(), None, Some("candidate"));
        let layout = layout_document(&doc, &PageGeometry::default());
        assert_eq!(layout.page_count(), 1);
        assert!(layout.texts().any(|t| t.contains("Smart Interview Final Report")));
    }

    #[test]
    fn test_long_answers_paginate_within_margins() {
        let geometry = PageGeometry::default();
        let doc = render_report(&analysis_with(6, &"detailed explanation ".repeat(120)), None, Some("c"));
        let layout = layout_document(&doc, &geometry);
        assert!(layout.page_count() > 1);
        for page in &layout.pages {
            for item in &page.items {
                if let PlacedItem::Text(t) = item {
                    assert!(t.y_pt >= geometry.margin_bottom_pt - t.size_pt);
                    assert!(t.y_pt <= geometry.height_pt - geometry.margin_top_pt);
                    assert!(t.x_pt >= geometry.margin_left_pt);
                }
            }
        }
    }

    #[test]
    fn test_page_breaks_start_new_pages() {
        use crate::analysis::models::{AggregateScore, Grade, SummaryRow};
        let mut analysis = analysis_with(1, "short");
        analysis.summary_table = vec![SummaryRow {
            label: "Topic".to_string(),
            score_raw: "8/10".to_string(),
        }];
        let aggregate = AggregateScore {
            total: 8.0,
            count: 1,
            average_percent: 80,
            grade: Grade::Good,
        };
        let doc = render_report(&analysis, Some(&aggregate), Some("c"));
        let layout = layout_document(&doc, &PageGeometry::default());
        assert_eq!(layout.page_count(), 3);

        let first_text = |page: &LaidOutPage| {
            page.items.iter().find_map(|i| match i {
                PlacedItem::Text(t) => Some(t.text.clone()),
                PlacedItem::Rule(_) => None,
            })
        };
        assert_eq!(first_text(&layout.pages[1]).as_deref(), Some("Summary Table"));
        assert_eq!(
            first_text(&layout.pages[2]).as_deref(),
            Some("Final Interview Analysis")
        );
    }

    #[test]
    fn test_layout_is_deterministic() {
        let doc = render_report(&analysis_with(3, "an answer"), None, Some("c"));
        let geometry = PageGeometry::default();
        assert_eq!(layout_document(&doc, &geometry), layout_document(&doc, &geometry));
    }
}
