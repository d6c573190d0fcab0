use serde::{Deserialize, Serialize};

/// One question/answer pair with the model's feedback, score, and suggestion.
///
/// Fields are taken verbatim from the completion output. `score_raw` keeps the
/// model's string (e.g. `"9/10"`); numeric extraction happens in scoring only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub answer: String,
    pub feedback: String,
    pub score_raw: String,
    pub suggestion: String,
}

/// A condensed `(label, score)` row for the summary table.
/// Not cross-checked against the evaluation records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub score_raw: String,
}

/// Typed result of a successfully parsed completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Model output order, preserved end to end.
    pub questions: Vec<EvaluationRecord>,
    pub summary_table: Vec<SummaryRow>,
    /// Error tag reported by the model alongside its output, if any.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    Excellent,
    Good,
    NeedsImprovement,
}

impl Grade {
    /// Thresholds are inclusive: 85 is Excellent, 70 is Good.
    pub fn from_percent(average_percent: i64) -> Self {
        if average_percent >= 85 {
            Grade::Excellent
        } else if average_percent >= 70 {
            Grade::Good
        } else {
            Grade::NeedsImprovement
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::NeedsImprovement => "Needs Improvement",
        }
    }

    pub fn remark(&self) -> &'static str {
        match self {
            Grade::Excellent => {
                "Consistently strong answers. Keep refining depth and delivery to stay at this level."
            }
            Grade::Good => {
                "Solid overall performance. Targeted practice on the weaker answers will lift the score further."
            }
            Grade::NeedsImprovement => {
                "Several answers fell short. Review the suggestions for each question and practice them before the next interview."
            }
        }
    }
}

/// Overall score derived from the per-question scores of one `AnalysisResult`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub total: f64,
    pub count: usize,
    pub average_percent: i64,
    pub grade: Grade,
}

impl AggregateScore {
    /// Maximum attainable total for `count` questions scored out of ten.
    pub fn max_total(&self) -> usize {
        self.count * 10
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_boundaries_inclusive() {
        assert_eq!(Grade::from_percent(85), Grade::Excellent);
        assert_eq!(Grade::from_percent(84), Grade::Good);
        assert_eq!(Grade::from_percent(70), Grade::Good);
        assert_eq!(Grade::from_percent(69), Grade::NeedsImprovement);
        assert_eq!(Grade::from_percent(100), Grade::Excellent);
        assert_eq!(Grade::from_percent(0), Grade::NeedsImprovement);
    }

    #[test]
    fn test_grade_labels() {
        assert_eq!(Grade::NeedsImprovement.label(), "Needs Improvement");
        assert!(!Grade::Good.remark().is_empty());
    }
}
