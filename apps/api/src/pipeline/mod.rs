//! Report orchestration.
//!
//! `ReportPipeline::run` sequences prompt → completion → parse → (aggregate, render) →
//! write. Any fatal error is returned unchanged and nothing is written: the document is
//! only persisted after analysis has fully succeeded.
//!
//! `FeedbackService` wraps the pipeline with transcript lookup and delivery for the
//! email-driven flow.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::analysis::parser::parse_analysis;
use crate::analysis::prompts::{build_evaluation_prompt, PROMPT_VERSION};
use crate::analysis::scoring::{aggregate_scores, ScoreSummary, UnparsableScorePolicy};
use crate::analysis::AnalysisResult;
use crate::delivery::{ReportDelivery, FEEDBACK_EMAIL_BODY, FEEDBACK_EMAIL_SUBJECT};
use crate::errors::ReportError;
use crate::llm_client::CompletionService;
use crate::report::{render_report, ReportArtifact, ReportWriter};
use crate::transcripts::TranscriptSource;

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub artifact: ReportArtifact,
    pub analysis: AnalysisResult,
    pub scores: ScoreSummary,
}

impl GeneratedReport {
    /// Number of questions whose score contributed to the aggregate.
    pub fn scored_count(&self) -> usize {
        self.scores.aggregate.as_ref().map_or(0, |a| a.count)
    }
}

pub struct ReportPipeline {
    completion: Arc<dyn CompletionService>,
    writer: ReportWriter,
    policy: UnparsableScorePolicy,
}

impl ReportPipeline {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        writer: ReportWriter,
        policy: UnparsableScorePolicy,
    ) -> Self {
        Self {
            completion,
            writer,
            policy,
        }
    }

    /// Analyses `transcript` and writes the report. `candidate` names the title page and
    /// the artifact when present.
    pub async fn run(
        &self,
        transcript: &str,
        candidate: Option<&str>,
    ) -> Result<GeneratedReport, ReportError> {
        let prompt = build_evaluation_prompt(transcript);
        info!(
            prompt_version = PROMPT_VERSION,
            transcript_chars = transcript.chars().count(),
            "Requesting transcript analysis"
        );

        let content = self.completion.complete(&prompt).await?;
        let analysis = parse_analysis(&content)?;
        let scores = aggregate_scores(&analysis.questions, self.policy);
        info!(
            questions = analysis.questions.len(),
            unparsed_scores = scores.unparsed.len(),
            "Analysis parsed"
        );

        let document = render_report(&analysis, scores.aggregate.as_ref(), candidate);
        let artifact = self.writer.write(&document).await?;

        Ok(GeneratedReport {
            artifact,
            analysis,
            scores,
        })
    }
}

/// Summary returned to callers of the email-driven flow.
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackOutcome {
    pub report_file: String,
    pub questions: usize,
    pub scored: usize,
    pub average_percent: Option<i64>,
    pub grade: Option<String>,
}

impl From<&GeneratedReport> for FeedbackOutcome {
    fn from(report: &GeneratedReport) -> Self {
        let aggregate = report.scores.aggregate.as_ref();
        Self {
            report_file: report.artifact.file_name.clone(),
            questions: report.analysis.questions.len(),
            scored: report.scored_count(),
            average_percent: aggregate.map(|a| a.average_percent),
            grade: aggregate.map(|a| a.grade.label().to_string()),
        }
    }
}

/// Looks up a participant's transcript, builds the report, and emails it to them.
pub struct FeedbackService {
    transcripts: Arc<dyn TranscriptSource>,
    pipeline: Arc<ReportPipeline>,
    delivery: Arc<dyn ReportDelivery>,
}

impl FeedbackService {
    pub fn new(
        transcripts: Arc<dyn TranscriptSource>,
        pipeline: Arc<ReportPipeline>,
        delivery: Arc<dyn ReportDelivery>,
    ) -> Self {
        Self {
            transcripts,
            pipeline,
            delivery,
        }
    }

    pub async fn send_feedback(&self, email: &str) -> Result<FeedbackOutcome, ReportError> {
        let email = email.trim();
        self.delivery.check_configured()?;
        let transcript = self.transcripts.latest_for_email(email).await?;

        let report = self
            .pipeline
            .run(&transcript.transcript_text, Some(subject_from_email(email)))
            .await?;

        self.delivery
            .deliver(
                email,
                FEEDBACK_EMAIL_SUBJECT,
                FEEDBACK_EMAIL_BODY,
                &report.artifact.path,
            )
            .await?;

        Ok(FeedbackOutcome::from(&report))
    }
}

/// Local part of an address, used as the report subject.
pub fn subject_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email).trim()
}
