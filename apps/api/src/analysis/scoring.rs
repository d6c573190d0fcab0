use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::analysis::models::{AggregateScore, EvaluationRecord, Grade};

/// What to do with a record whose score string is not numeric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnparsableScorePolicy {
    /// Leave the record out of the aggregate entirely.
    #[default]
    Exclude,
    /// Count the record as 0/10.
    CountAsZero,
}

impl FromStr for UnparsableScorePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(UnparsableScorePolicy::Exclude),
            "zero" | "count_as_zero" => Ok(UnparsableScorePolicy::CountAsZero),
            other => Err(format!("unknown unparsable score policy: {other}")),
        }
    }
}

/// Non-fatal: one record's score could not be read as a number.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartialScoreParseFailure {
    /// Zero-based position of the record in the analysis.
    pub index: usize,
    pub raw: String,
}

/// Aggregate plus the records that did not contribute a parsed score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    /// `None` when no score could be used; the final section is then omitted.
    pub aggregate: Option<AggregateScore>,
    pub unparsed: Vec<PartialScoreParseFailure>,
}

/// Reads the numeric part of a score string such as `"9/10"`, `"7.5 / 10"`, or `"8"`.
///
/// Only an out-of-ten suffix is stripped; any other denominator is rejected so it
/// cannot silently skew a total that assumes ten points per question.
pub fn parse_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let numerator = match trimmed.split_once('/') {
        Some((num, denom)) => {
            if denom.trim() != "10" {
                return None;
            }
            num.trim()
        }
        None => trimmed,
    };
    let value = numerator.parse::<f64>().ok()?;
    value.is_finite().then_some(value)
}

/// Text shown on the score line of a question block: the raw score without its
/// trailing `/10`.
pub fn score_display(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix("/10")
        .map(str::trim_end)
        .unwrap_or(trimmed)
}

/// Computes the overall score and grade for a sequence of evaluation records.
///
/// `average_percent = round(total / (count * 10) * 100)`, rounding half to even.
/// Records whose score cannot be parsed are reported in `unparsed` and handled
/// according to `policy`.
pub fn aggregate_scores(
    records: &[EvaluationRecord],
    policy: UnparsableScorePolicy,
) -> ScoreSummary {
    let mut scores: Vec<f64> = Vec::with_capacity(records.len());
    let mut unparsed = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match parse_score(&record.score_raw) {
            Some(score) => scores.push(score),
            None => {
                warn!(
                    index,
                    raw = %record.score_raw,
                    ?policy,
                    "Score could not be parsed"
                );
                unparsed.push(PartialScoreParseFailure {
                    index,
                    raw: record.score_raw.clone(),
                });
                if policy == UnparsableScorePolicy::CountAsZero {
                    scores.push(0.0);
                }
            }
        }
    }

    ScoreSummary {
        aggregate: compute_aggregate(&scores),
        unparsed,
    }
}

/// Aggregate over already-parsed scores. `None` for an empty slice.
pub fn compute_aggregate(scores: &[f64]) -> Option<AggregateScore> {
    if scores.is_empty() {
        return None;
    }

    let total: f64 = scores.iter().sum();
    let count = scores.len();
    // total / (count * 10) * 100, multiplied first to keep whole percentages exact
    let average_percent = (total * 100.0 / (count as f64 * 10.0)).round_ties_even() as i64;

    Some(AggregateScore {
        total,
        count,
        average_percent,
        grade: Grade::from_percent(average_percent),
    })
}
