//! Validates raw completion content into a typed `AnalysisResult`.
//!
//! The top-level object must carry a `"questions"` array. Individual question entries
//! are parsed leniently: missing or `null` fields become empty text and numeric values
//! are converted to their string form, so a ragged model output never aborts the run.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::analysis::models::{AnalysisResult, EvaluationRecord, SummaryRow};
use crate::errors::ReportError;

#[derive(Debug, Deserialize)]
struct RawAnalysis {
    questions: Option<Vec<RawQuestion>>,
    #[serde(default)]
    summary_table: Option<Vec<Value>>,
    #[serde(default)]
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(default, deserialize_with = "lenient_text")]
    question: String,
    #[serde(default, deserialize_with = "lenient_text")]
    answer: String,
    #[serde(default, deserialize_with = "lenient_text")]
    feedback: String,
    #[serde(default, deserialize_with = "lenient_text")]
    score: String,
    #[serde(default, deserialize_with = "lenient_text")]
    suggestion: String,
}

/// Accepts strings, numbers, booleans, and `null` as text.
fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses raw completion content into an `AnalysisResult`.
///
/// Fails with `ResponseParseFailure` (carrying `raw`) when the content is not a JSON
/// object of the expected shape or when `"questions"` is absent.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult, ReportError> {
    let body = strip_json_fences(raw);

    let parsed: RawAnalysis = serde_json::from_str(body).map_err(|e| {
        ReportError::parse_failure(format!("content is not a valid analysis object: {e}"), raw)
    })?;

    let error = parsed.error.as_ref().map(value_to_text);

    let questions = match parsed.questions {
        Some(questions) => questions,
        None => {
            let message = match &error {
                Some(tag) => format!("analysis reported an error and no \"questions\": {tag}"),
                None => "response is missing the \"questions\" key".to_string(),
            };
            return Err(ReportError::parse_failure(message, raw));
        }
    };

    let questions = questions
        .into_iter()
        .map(|q| EvaluationRecord {
            question: q.question,
            answer: q.answer,
            feedback: q.feedback,
            score_raw: q.score,
            suggestion: q.suggestion,
        })
        .collect();

    let summary_table = parsed
        .summary_table
        .unwrap_or_default()
        .iter()
        .filter_map(summary_row)
        .collect();

    Ok(AnalysisResult {
        questions,
        summary_table,
        error,
    })
}

/// Reads a `[label, score]` pair. Short rows are padded with empty text; rows that
/// are not arrays are dropped.
fn summary_row(value: &Value) -> Option<SummaryRow> {
    let cells = value.as_array()?;
    let cell = |i: usize| cells.get(i).map(value_to_text).unwrap_or_default();
    Some(SummaryRow {
        label: cell(0),
        score_raw: cell(1),
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub(crate) fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
