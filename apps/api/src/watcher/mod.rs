//! Mailbox watcher — turns "Request Feedback" emails into delivered reports.
//!
//! Polls the Gmail REST API on a fixed interval for unread INBOX messages with the
//! subject "Request Feedback". Each message is marked read before its report is built,
//! so a failing request is not picked up again on the next poll. A failure for one
//! message is logged and the remaining messages are still processed.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::config::WatcherConfig;
use crate::errors::ReportError;
use crate::pipeline::FeedbackService;

pub const REQUEST_QUERY: &str = "subject:\"Request Feedback\" is:unread";

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// OAuth client and refresh token of an authorized Google user.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl GoogleCredentials {
    /// Accepts the credentials JSON inline, or a path to a file containing it.
    pub fn load(value: &str) -> Result<Self, ReportError> {
        let text = if value.trim_start().starts_with('{') {
            value.to_string()
        } else {
            std::fs::read_to_string(value)?
        };
        serde_json::from_str(&text).map_err(|e| {
            ReportError::configuration_missing(format!(
                "GOOGLE_CREDENTIALS_JSON must hold client_id, client_secret and refresh_token: {e}"
            ))
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    #[serde(default)]
    messages: Vec<MessageRef>,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageMetadata {
    payload: Option<MessagePayload>,
}

#[derive(Debug, Deserialize)]
struct MessagePayload {
    #[serde(default)]
    headers: Vec<MessageHeader>,
}

#[derive(Debug, Deserialize)]
struct MessageHeader {
    name: String,
    value: String,
}

/// Minimal Gmail REST client: list, read headers, mark read.
#[derive(Clone)]
pub struct GmailClient {
    http: Client,
    credentials: GoogleCredentials,
    api_base: String,
    token_uri: String,
}

impl GmailClient {
    pub fn new(credentials: GoogleCredentials) -> Self {
        let token_uri = credentials
            .token_uri
            .clone()
            .unwrap_or_else(|| GOOGLE_TOKEN_URI.to_string());
        Self::with_endpoints(credentials, GMAIL_API_BASE, &token_uri)
    }

    pub fn with_endpoints(credentials: GoogleCredentials, api_base: &str, token_uri: &str) -> Self {
        Self {
            http: Client::new(),
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_uri: token_uri.to_string(),
        }
    }

    /// Exchanges the refresh token for a short-lived access token.
    pub async fn access_token(&self) -> Result<String, ReportError> {
        let response = self
            .http
            .post(&self.token_uri)
            .form(&[
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.as_str()),
                ("refresh_token", self.credentials.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| gmail_failure("token refresh failed", e))?;
        let token: TokenResponse = read_json(response, "token refresh").await?;
        Ok(token.access_token)
    }

    pub async fn unread_request_ids(&self, token: &str) -> Result<Vec<String>, ReportError> {
        let response = self
            .http
            .get(format!("{}/messages", self.api_base))
            .bearer_auth(token)
            .query(&[("q", REQUEST_QUERY), ("labelIds", "INBOX")])
            .send()
            .await
            .map_err(|e| gmail_failure("message list failed", e))?;
        let list: MessageList = read_json(response, "message list").await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    /// Raw `From` header of a message, if present.
    pub async fn from_header(&self, token: &str, id: &str) -> Result<Option<String>, ReportError> {
        let response = self
            .http
            .get(format!("{}/messages/{id}", self.api_base))
            .bearer_auth(token)
            .query(&[("format", "metadata"), ("metadataHeaders", "From")])
            .send()
            .await
            .map_err(|e| gmail_failure("message fetch failed", e))?;
        let metadata: MessageMetadata = read_json(response, "message fetch").await?;
        Ok(metadata.payload.and_then(|p| {
            p.headers
                .into_iter()
                .find(|h| h.name.eq_ignore_ascii_case("from"))
                .map(|h| h.value)
        }))
    }

    pub async fn mark_read(&self, token: &str, id: &str) -> Result<(), ReportError> {
        let response = self
            .http
            .post(format!("{}/messages/{id}/modify", self.api_base))
            .bearer_auth(token)
            .json(&json!({ "removeLabelIds": ["UNREAD"] }))
            .send()
            .await
            .map_err(|e| gmail_failure("mark read failed", e))?;
        let _: serde_json::Value = read_json(response, "mark read").await?;
        Ok(())
    }
}

fn gmail_failure(context: &str, e: reqwest::Error) -> ReportError {
    ReportError::UpstreamRequestFailure {
        message: format!("gmail {context}: {e}"),
        status: e.status().map(|s| s.as_u16()),
        body: String::new(),
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T, ReportError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| gmail_failure(context, e))?;
    if !status.is_success() {
        return Err(ReportError::UpstreamRequestFailure {
            message: format!("gmail {context} returned status {status}"),
            status: Some(status.as_u16()),
            body,
        });
    }
    serde_json::from_str(&body)
        .map_err(|e| ReportError::parse_failure(format!("gmail {context}: {e}"), body))
}

/// Extracts the address from a `From` header: `"Jane <jane@x.com>"` → `jane@x.com`.
pub fn sender_address(from: &str) -> Option<String> {
    let from = from.trim();
    let address = match (from.rfind('<'), from.rfind('>')) {
        (Some(start), Some(end)) if start < end => &from[start + 1..end],
        _ => from,
    };
    let address = address.trim().trim_matches('"');
    (!address.is_empty() && address.contains('@')).then(|| address.to_string())
}

pub struct MailboxWatcher {
    gmail: GmailClient,
    feedback: Arc<FeedbackService>,
    interval: Duration,
}

impl MailboxWatcher {
    pub fn new(gmail: GmailClient, feedback: Arc<FeedbackService>, interval: Duration) -> Self {
        Self {
            gmail,
            feedback,
            interval,
        }
    }

    pub fn from_config(
        config: &WatcherConfig,
        feedback: Arc<FeedbackService>,
    ) -> Result<Self, ReportError> {
        let credentials = GoogleCredentials::load(&config.credentials_json)?;
        Ok(Self::new(
            GmailClient::new(credentials),
            feedback,
            Duration::from_secs(config.interval_secs.max(1)),
        ))
    }

    /// Handles every pending request once. Returns how many reports were delivered.
    pub async fn poll_once(&self) -> Result<usize, ReportError> {
        let token = self.gmail.access_token().await?;
        let ids = self.gmail.unread_request_ids(&token).await?;
        if ids.is_empty() {
            info!("No new feedback requests");
            return Ok(0);
        }

        let mut delivered = 0;
        for id in ids {
            let sender = match self.gmail.from_header(&token, &id).await {
                Ok(header) => header.as_deref().and_then(sender_address),
                Err(e) => {
                    warn!(message_id = %id, kind = e.kind(), "Could not read request: {e}");
                    continue;
                }
            };

            if let Err(e) = self.gmail.mark_read(&token, &id).await {
                warn!(message_id = %id, kind = e.kind(), "Could not mark request read: {e}");
                continue;
            }

            let Some(sender) = sender else {
                warn!(message_id = %id, "Request has no usable sender address");
                continue;
            };

            match self.feedback.send_feedback(&sender).await {
                Ok(outcome) => {
                    info!(
                        message_id = %id,
                        report = %outcome.report_file,
                        "Feedback delivered"
                    );
                    delivered += 1;
                }
                Err(e) => {
                    warn!(message_id = %id, kind = e.kind(), "Feedback request failed: {e}");
                }
            }
        }
        Ok(delivered)
    }

    /// Polls forever. The first poll happens immediately.
    pub async fn run(self) {
        info!(interval_secs = self.interval.as_secs(), "Mailbox watcher started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_once().await {
                error!(kind = e.kind(), "Mailbox poll failed: {e}");
            }
        }
    }
}
