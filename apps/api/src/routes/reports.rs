use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use crate::errors::{AppError, ReportError};
use crate::pipeline::FeedbackOutcome;
use crate::state::AppState;
use crate::transcripts::looks_like_email;

/// A transcript upload: the file contents plus how to read them.
struct Upload {
    bytes: Bytes,
    is_pdf: bool,
}

impl Upload {
    fn new(bytes: Bytes, file_name: Option<&str>, content_type: Option<&str>) -> Self {
        let is_pdf = content_type == Some("application/pdf")
            || file_name.is_some_and(|n| n.to_ascii_lowercase().ends_with(".pdf"))
            || bytes.starts_with(b"%PDF");
        Self { bytes, is_pdf }
    }

    async fn into_text(self) -> Result<String, AppError> {
        if self.is_pdf {
            let bytes = self.bytes;
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
                .await
                .map_err(|e| AppError::Internal(anyhow::anyhow!("PDF extraction task failed: {e}")))?
                .map_err(|e| AppError::Validation(format!("could not read text from PDF: {e}")))
        } else {
            String::from_utf8(self.bytes.to_vec())
                .map_err(|_| AppError::Validation("transcript file must be UTF-8 text or PDF".to_string()))
        }
    }
}

/// POST /api/v1/reports
///
/// Multipart form with a `file` field (text or PDF transcript) and an optional
/// `subject` field. Responds with the generated PDF as an attachment.
pub async fn handle_generate_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut upload = None;
    let mut subject = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
                upload = Some(Upload::new(bytes, file_name.as_deref(), content_type.as_deref()));
            }
            Some("subject") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read subject: {e}")))?;
                subject = Some(text);
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| AppError::Validation("file field is required".to_string()))?;
    let transcript = upload.into_text().await?;
    if transcript.trim().is_empty() {
        return Err(AppError::Validation("transcript is empty".to_string()));
    }

    let report = state.pipeline.run(&transcript, subject.as_deref()).await?;
    let pdf = tokio::fs::read(&report.artifact.path)
        .await
        .map_err(ReportError::from)?;

    info!(
        file = %report.artifact.file_name,
        questions = report.analysis.questions.len(),
        "Report generated from upload"
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", report.artifact.file_name),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct EmailReportRequest {
    pub email: String,
}

/// POST /api/v1/reports/email
pub async fn handle_email_report(
    State(state): State<AppState>,
    Json(req): Json<EmailReportRequest>,
) -> Result<Json<FeedbackOutcome>, AppError> {
    if !looks_like_email(&req.email) {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            req.email
        )));
    }
    let outcome = state.feedback.send_feedback(&req.email).await?;
    Ok(Json(outcome))
}
