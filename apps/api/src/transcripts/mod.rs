// Transcript storage — the source of interview transcripts keyed by participant email.
// Lookups return the most recent transcript for an address, case-insensitively.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::errors::{AppError, ReportError};
use crate::models::transcript::{NewTranscript, TranscriptRow};

#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Latest transcript stored for `email`, or `TranscriptNotFound`.
    async fn latest_for_email(&self, email: &str) -> Result<TranscriptRow, ReportError>;
}

#[derive(Clone)]
pub struct PgTranscriptStore {
    pool: PgPool,
}

impl PgTranscriptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_latest(&self, email: &str) -> Result<Option<TranscriptRow>, sqlx::Error> {
        sqlx::query_as::<_, TranscriptRow>(
            r#"
            SELECT id, email, room_id, transcript_text, created_at
            FROM transcripts
            WHERE lower(email) = lower($1)
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn insert(&self, new: &NewTranscript) -> Result<TranscriptRow, AppError> {
        validate_new_transcript(new)?;

        let row = sqlx::query_as::<_, TranscriptRow>(
            r#"
            INSERT INTO transcripts (email, room_id, transcript_text)
            VALUES ($1, $2, $3)
            RETURNING id, email, room_id, transcript_text, created_at
            "#,
        )
        .bind(new.email.trim())
        .bind(new.room_id.as_deref())
        .bind(&new.transcript_text)
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %row.id, "Transcript stored");
        Ok(row)
    }
}

#[async_trait]
impl TranscriptSource for PgTranscriptStore {
    async fn latest_for_email(&self, email: &str) -> Result<TranscriptRow, ReportError> {
        match self.find_latest(email).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(ReportError::TranscriptNotFound {
                key: email.to_string(),
            }),
            Err(e) => Err(ReportError::Storage {
                message: format!("transcript lookup failed: {e}"),
            }),
        }
    }
}

pub fn validate_new_transcript(new: &NewTranscript) -> Result<(), AppError> {
    if !looks_like_email(&new.email) {
        return Err(AppError::Validation(format!(
            "'{}' is not a valid email address",
            new.email
        )));
    }
    if new.transcript_text.trim().is_empty() {
        return Err(AppError::Validation(
            "transcript_text must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Shape check only: one `@` with a non-empty local part and a dotted domain.
pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_transcript(email: &str, text: &str) -> NewTranscript {
        NewTranscript {
            email: email.to_string(),
            room_id: None,
            transcript_text: text.to_string(),
        }
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("jane@example.com"));
        assert!(looks_like_email("  jane.doe+x@mail.example.org "));
        assert!(!looks_like_email("jane"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("jane@localhost"));
        assert!(!looks_like_email("ja ne@example.com"));
        assert!(!looks_like_email("a@b@example.com"));
    }

    #[test]
    fn test_validate_rejects_blank_transcript() {
        let err = validate_new_transcript(&new_transcript("jane@example.com", "  \n"));
        assert!(matches!(err, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_accepts_well_formed() {
        assert!(validate_new_transcript(&new_transcript("jane@example.com", "Q: hi")).is_ok());
    }
}
