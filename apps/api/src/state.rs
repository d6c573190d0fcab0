use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::{FeedbackService, ReportPipeline};
use crate::transcripts::PgTranscriptStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub transcripts: PgTranscriptStore,
    /// Transcript → PDF pipeline used by the upload endpoint.
    pub pipeline: Arc<ReportPipeline>,
    /// Lookup + pipeline + email delivery, shared with the mailbox watcher.
    pub feedback: Arc<FeedbackService>,
}
