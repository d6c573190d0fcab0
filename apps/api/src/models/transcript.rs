use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TranscriptRow {
    pub id: Uuid,
    pub email: String,
    pub room_id: Option<String>,
    pub transcript_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTranscript {
    pub email: String,
    #[serde(default)]
    pub room_id: Option<String>,
    pub transcript_text: String,
}
