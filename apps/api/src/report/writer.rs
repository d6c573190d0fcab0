//! Persists rendered reports as PDF files under the output directory.
//!
//! Files are written to a temporary path inside the output directory and moved into
//! place once complete, so a failed render never leaves a partial report behind.
//! Names carry a millisecond timestamp plus a random token; two concurrent requests
//! for the same subject never collide.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::errors::ReportError;
use crate::report::document::{ReportDocument, REPORT_TITLE};
use crate::report::layout::{layout_document, PageGeometry};
use crate::report::pdf::write_pdf;

/// A report file that has been fully written.
#[derive(Debug, Clone, Serialize)]
pub struct ReportArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub page_count: usize,
}

#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
    geometry: PageGeometry,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            geometry: PageGeometry::default(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Lays out and writes `document`, returning where it landed.
    ///
    /// Creates the output directory if needed. Layout and PDF encoding run on the
    /// blocking pool.
    pub async fn write(&self, document: &ReportDocument) -> Result<ReportArtifact, ReportError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let file_name = report_file_name(&document.subject);
        let path = self.output_dir.join(&file_name);

        let document = document.clone();
        let geometry = self.geometry.clone();
        let dir = self.output_dir.clone();
        let target = path.clone();

        let page_count = tokio::task::spawn_blocking(move || -> Result<usize, ReportError> {
            let layout = layout_document(&document, &geometry);
            let temp = tempfile::Builder::new()
                .prefix(".report-")
                .suffix(".pdf.tmp")
                .tempfile_in(&dir)?;

            let mut out = BufWriter::new(temp.as_file());
            write_pdf(&layout, REPORT_TITLE, &mut out)?;
            out.into_inner().map_err(|e| e.into_error())?;
            temp.as_file().sync_all()?;

            temp.persist_noclobber(&target).map_err(|e| e.error)?;
            Ok(layout.page_count())
        })
        .await
        .map_err(|e| ReportError::Render {
            message: format!("report rendering task failed: {e}"),
        })??;

        info!(
            file = %path.display(),
            pages = page_count,
            "Report written"
        );

        Ok(ReportArtifact {
            path,
            file_name,
            page_count,
        })
    }
}

/// Reduces `subject` to `[A-Za-z0-9_-]` for use in a file name.
pub fn sanitize_subject(subject: &str) -> String {
    let cleaned: String = subject
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "report".to_string()
    } else {
        cleaned.chars().take(64).collect()
    }
}

fn report_file_name(subject: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_feedback_{}-{}.pdf",
        sanitize_subject(subject),
        millis,
        &token[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisResult, EvaluationRecord};
    use crate::report::document::render_report;

    fn document(subject: &str) -> ReportDocument {
        let analysis = AnalysisResult {
            questions: vec![EvaluationRecord {
                question: "What is a trait object?".to_string(),
                answer: "A dyn pointer with a vtable.".to_string(),
                feedback: "Good.".to_string(),
                score_raw: "8/10".to_string(),
                suggestion: "Discuss object safety.".to_string(),
            }],
            ..AnalysisResult::default()
        };
        render_report(&analysis, None, Some(subject))
    }

    #[test]
    fn test_sanitize_subject() {
        assert_eq!(sanitize_subject("jane.doe"), "jane_doe");
        assert_eq!(sanitize_subject("../../etc/passwd"), "etc_passwd");
        assert_eq!(sanitize_subject("  "), "report");
        assert_eq!(sanitize_subject("ok-name_1"), "ok-name_1");
    }

    #[tokio::test]
    async fn test_write_creates_dir_and_single_file() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("static").join("reports");
        let writer = ReportWriter::new(&out);

        let artifact = writer.write(&document("jane")).await.unwrap();

        assert!(artifact.file_name.starts_with("jane_feedback_"));
        assert!(artifact.file_name.ends_with(".pdf"));
        assert_eq!(artifact.page_count, 1);

        let bytes = std::fs::read(&artifact.path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let entries: Vec<_> = std::fs::read_dir(&out).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_same_subject_gets_distinct_files() {
        let root = tempfile::tempdir().unwrap();
        let writer = ReportWriter::new(root.path());

        let doc = document("same");
        let (a, b) = tokio::join!(writer.write(&doc), writer.write(&doc));
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_ne!(a.path, b.path);
        assert!(a.path.exists());
        assert!(b.path.exists());
    }

    #[tokio::test]
    async fn test_unwritable_output_dir_is_io_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let writer = ReportWriter::new(blocker.join("reports"));
        let err = writer.write(&document("x")).await.unwrap_err();
        assert!(matches!(err, ReportError::Io(_)));
    }
}
