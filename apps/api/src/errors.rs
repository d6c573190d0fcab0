use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors produced by the analysis-and-report pipeline and its collaborators.
///
/// Every fatal outcome of a report request is one of these variants. Callers match on
/// the variant (or on `kind()`) rather than on message text.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Configuration missing: {what}")]
    ConfigurationMissing { what: String },

    #[error("No transcript found for {key}")]
    TranscriptNotFound { key: String },

    #[error("Completion request failed: {message}")]
    UpstreamRequestFailure {
        message: String,
        status: Option<u16>,
        body: String,
    },

    #[error("Completion response could not be parsed: {message}")]
    ResponseParseFailure { message: String, raw: String },

    #[error("Report delivery failed: {message}")]
    Delivery { message: String },

    #[error("Report rendering failed: {message}")]
    Render { message: String },

    #[error("Transcript storage failed: {message}")]
    Storage { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReportError {
    pub fn configuration_missing(what: impl Into<String>) -> Self {
        ReportError::ConfigurationMissing { what: what.into() }
    }

    pub fn parse_failure(message: impl Into<String>, raw: impl Into<String>) -> Self {
        ReportError::ResponseParseFailure {
            message: message.into(),
            raw: raw.into(),
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ReportError::ConfigurationMissing { .. } => "CONFIGURATION_MISSING",
            ReportError::TranscriptNotFound { .. } => "TRANSCRIPT_NOT_FOUND",
            ReportError::UpstreamRequestFailure { .. } => "UPSTREAM_REQUEST_FAILURE",
            ReportError::ResponseParseFailure { .. } => "RESPONSE_PARSE_FAILURE",
            ReportError::Delivery { .. } => "DELIVERY_FAILURE",
            ReportError::Render { .. } => "RENDER_FAILURE",
            ReportError::Storage { .. } => "STORAGE_FAILURE",
            ReportError::Io(_) => "IO_ERROR",
        }
    }

    /// Raw diagnostic payload (upstream body or unparsed model content), if any.
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            ReportError::UpstreamRequestFailure { body, .. } => Some(body),
            ReportError::ResponseParseFailure { raw, .. } => Some(raw),
            _ => None,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ReportError::ConfigurationMissing { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ReportError::TranscriptNotFound { .. } => StatusCode::NOT_FOUND,
            ReportError::UpstreamRequestFailure { .. }
            | ReportError::ResponseParseFailure { .. }
            | ReportError::Delivery { .. } => StatusCode::BAD_GATEWAY,
            ReportError::Render { .. } | ReportError::Storage { .. } | ReportError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, raw) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), None),
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
            AppError::Report(e) => {
                let status = e.status_code();
                if status.is_server_error() {
                    tracing::error!(kind = e.kind(), "Report error: {e}");
                }
                (
                    status,
                    e.kind(),
                    e.to_string(),
                    e.diagnostic().map(str::to_string),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                    None,
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(raw) = raw {
            error["raw"] = json!(raw);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
