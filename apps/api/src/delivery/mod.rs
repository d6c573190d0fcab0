// Report delivery — sends a finished report to its recipient as an email attachment.
// One attempt per call; the caller decides whether to try again.

use std::path::Path;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;
use crate::errors::ReportError;

pub const FEEDBACK_EMAIL_SUBJECT: &str = "Interview Feedback Report";
pub const FEEDBACK_EMAIL_BODY: &str = "Here is your interview feedback.";

#[async_trait]
pub trait ReportDelivery: Send + Sync {
    /// Fails if delivery could never succeed with the current settings. Called before any
    /// report work starts.
    fn check_configured(&self) -> Result<(), ReportError> {
        Ok(())
    }

    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        attachment: &Path,
    ) -> Result<(), ReportError>;
}

/// SMTP delivery over STARTTLS with username/password authentication.
#[derive(Clone)]
pub struct SmtpMailer {
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    fn credentials(&self) -> Result<(&str, &str), ReportError> {
        let sender = self
            .config
            .sender_email
            .as_deref()
            .ok_or_else(|| ReportError::configuration_missing("SENDER_EMAIL"))?;
        let password = self
            .config
            .sender_password
            .as_deref()
            .ok_or_else(|| ReportError::configuration_missing("SENDER_PASSWORD"))?;
        Ok((sender, password))
    }
}

fn delivery_failure(context: &str, e: impl std::fmt::Display) -> ReportError {
    ReportError::Delivery {
        message: format!("{context}: {e}"),
    }
}

/// Builds the multipart message: plain-text body plus the report as `application/pdf`.
pub fn build_message(
    sender: &str,
    recipient: &str,
    subject: &str,
    body: &str,
    file_name: &str,
    pdf: Vec<u8>,
) -> Result<Message, ReportError> {
    let from: Mailbox = sender
        .parse()
        .map_err(|e| delivery_failure("invalid sender address", e))?;
    let to: Mailbox = recipient
        .parse()
        .map_err(|e| delivery_failure("invalid recipient address", e))?;
    let pdf_type =
        ContentType::parse("application/pdf").map_err(|e| delivery_failure("content type", e))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(body.to_string()))
                .singlepart(Attachment::new(file_name.to_string()).body(pdf, pdf_type)),
        )
        .map_err(|e| delivery_failure("could not build message", e))
}

#[async_trait]
impl ReportDelivery for SmtpMailer {
    fn check_configured(&self) -> Result<(), ReportError> {
        self.credentials().map(|_| ())
    }

    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        attachment: &Path,
    ) -> Result<(), ReportError> {
        let (sender, password) = self.credentials()?;

        let pdf = tokio::fs::read(attachment)
            .await
            .map_err(|e| delivery_failure("could not read report", e))?;
        let file_name = attachment
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("report.pdf");
        let message = build_message(sender, recipient, subject, body, file_name, pdf)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(|e| delivery_failure("smtp relay", e))?
            .credentials(Credentials::new(sender.to_string(), password.to_string()))
            .build();

        transport
            .send(message)
            .await
            .map_err(|e| delivery_failure("smtp send failed", e))?;

        info!(recipient, file = file_name, "Report delivered");
        Ok(())
    }
}
