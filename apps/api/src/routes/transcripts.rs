use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::transcript::{NewTranscript, TranscriptRow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

/// GET /api/v1/transcripts?email=
pub async fn handle_get_transcript(
    State(state): State<AppState>,
    Query(params): Query<EmailQuery>,
) -> Result<Json<TranscriptRow>, AppError> {
    let email = params
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::Validation("email query parameter is required".to_string()))?;

    let row = state
        .transcripts
        .find_latest(email)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No transcript found for {email}")))?;
    Ok(Json(row))
}

/// POST /api/v1/transcripts
pub async fn handle_create_transcript(
    State(state): State<AppState>,
    Json(req): Json<NewTranscript>,
) -> Result<(StatusCode, Json<TranscriptRow>), AppError> {
    let row = state.transcripts.insert(&req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}
