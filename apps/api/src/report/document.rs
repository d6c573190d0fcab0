//! Report document model — the ordered section sequence produced from an analysis.
//!
//! Building a `ReportDocument` is pure and infallible. Layout and PDF serialization
//! happen afterwards (`report::layout`, `report::pdf`), so the section structure can be
//! inspected and tested without touching the filesystem.

use serde::Serialize;

use crate::analysis::scoring::score_display;
use crate::analysis::{AggregateScore, AnalysisResult, EvaluationRecord};

pub const REPORT_TITLE: &str = "Smart Interview Final Report";
pub const SUMMARY_HEADING: &str = "Summary Table";
pub const FINAL_HEADING: &str = "Final Interview Analysis";
pub const SUMMARY_HEADER: [&str; 2] = ["Question", "Score"];
/// File-name subject used when no candidate name is known.
pub const DEFAULT_SUBJECT: &str = "feedback";

const CLOSING_NOTE: &str = "This score reflects the interviewee's overall performance in \
    communication, confidence, coding, and behavioral questions.";

/// Visual role of a text block. `report::layout` maps each to font, size, and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextStyle {
    Heading,
    Subtitle,
    SectionTitle,
    Label,
    Card,
    FinalScore,
    Highlight,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Block {
    Text { style: TextStyle, text: String },
    Rule,
    Spacer { height_pt: f32 },
    PageBreak,
    Table {
        header: [String; 2],
        rows: Vec<[String; 2]>,
    },
}

impl Block {
    fn text(style: TextStyle, text: impl Into<String>) -> Self {
        Block::Text {
            style,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SectionKind {
    Title,
    Question,
    SummaryTable,
    FinalAggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub kind: SectionKind,
    pub blocks: Vec<Block>,
}

/// A fully built report: title, one section per question, then the optional summary
/// and aggregate sections, in that order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDocument {
    pub subject: String,
    pub sections: Vec<Section>,
}

impl ReportDocument {
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }
}

#[cfg(test)]
impl ReportDocument {
    pub fn section_kinds(&self) -> Vec<SectionKind> {
        self.sections.iter().map(|s| s.kind).collect()
    }

    pub fn question_count(&self) -> usize {
        self.sections
            .iter()
            .filter(|s| s.kind == SectionKind::Question)
            .count()
    }
}

/// Builds the report for `candidate` from a parsed analysis and its aggregate.
///
/// The title page names the candidate only when one is given; the document subject
/// (used for the file name) falls back to `DEFAULT_SUBJECT`.
pub fn render_report(
    analysis: &AnalysisResult,
    aggregate: Option<&AggregateScore>,
    candidate: Option<&str>,
) -> ReportDocument {
    let candidate = candidate.map(str::trim).filter(|c| !c.is_empty());
    let mut sections = Vec::with_capacity(analysis.questions.len() + 3);

    sections.push(title_section(candidate));

    sections.extend(
        analysis
            .questions
            .iter()
            .enumerate()
            .map(|(index, record)| question_section(index, record)),
    );

    if !analysis.summary_table.is_empty() {
        let rows = analysis
            .summary_table
            .iter()
            .map(|row| [row.label.clone(), row.score_raw.clone()])
            .collect();
        sections.push(Section {
            kind: SectionKind::SummaryTable,
            blocks: vec![
                Block::PageBreak,
                Block::text(TextStyle::Heading, SUMMARY_HEADING),
                Block::Table {
                    header: SUMMARY_HEADER.map(str::to_string),
                    rows,
                },
            ],
        });
    }

    if let Some(aggregate) = aggregate {
        sections.push(final_section(aggregate));
    }

    ReportDocument {
        subject: candidate.unwrap_or(DEFAULT_SUBJECT).to_string(),
        sections,
    }
}

fn title_section(candidate: Option<&str>) -> Section {
    let mut blocks = vec![Block::text(TextStyle::Heading, REPORT_TITLE)];
    if let Some(candidate) = candidate {
        blocks.push(Block::text(TextStyle::Subtitle, format!("Candidate: {candidate}")));
    }
    blocks.push(Block::Rule);
    blocks.push(Block::Spacer { height_pt: 16.0 });
    Section {
        kind: SectionKind::Title,
        blocks,
    }
}

/// `index` is zero-based; headings are numbered from 1 regardless of empty fields.
fn question_section(index: usize, record: &EvaluationRecord) -> Section {
    Section {
        kind: SectionKind::Question,
        blocks: vec![
            Block::text(
                TextStyle::SectionTitle,
                format!("Q{}. {}", index + 1, record.question),
            ),
            Block::text(TextStyle::Label, "Answer:"),
            Block::text(TextStyle::Card, record.answer.as_str()),
            Block::text(TextStyle::Label, "Feedback:"),
            Block::text(TextStyle::Card, record.feedback.as_str()),
            Block::text(
                TextStyle::Label,
                format!("Score: {} / 10", score_display(&record.score_raw)),
            ),
            Block::text(TextStyle::Label, "Suggestion:"),
            Block::text(TextStyle::Card, record.suggestion.as_str()),
            Block::Spacer { height_pt: 12.0 },
        ],
    }
}

fn final_section(aggregate: &AggregateScore) -> Section {
    Section {
        kind: SectionKind::FinalAggregate,
        blocks: vec![
            Block::PageBreak,
            Block::text(TextStyle::Heading, FINAL_HEADING),
            Block::text(
                TextStyle::Label,
                format!("Total Questions Evaluated: {}", aggregate.count),
            ),
            Block::text(
                TextStyle::Label,
                format!(
                    "Total Score: {:.1} / {}",
                    aggregate.total,
                    aggregate.max_total()
                ),
            ),
            Block::text(
                TextStyle::FinalScore,
                format!("Average Score: {}%", aggregate.average_percent),
            ),
            Block::text(
                TextStyle::Highlight,
                format!("Overall Remark: {}", aggregate.grade.label()),
            ),
            Block::Spacer { height_pt: 12.0 },
            Block::text(TextStyle::Card, aggregate.grade.remark()),
            Block::text(TextStyle::Card, CLOSING_NOTE),
        ],
    }
}
