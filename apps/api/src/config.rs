use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::analysis::scoring::UnparsableScorePolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup only for variables the HTTP server cannot run without;
/// credentials for outbound services are checked when they are first needed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub completion: CompletionConfig,
    pub report_output_dir: PathBuf,
    pub upload_max_bytes: usize,
    pub score_policy: UnparsableScorePolicy,
    pub smtp: SmtpConfig,
    pub watcher: Option<WatcherConfig>,
}

/// Settings for the chat-completion service that analyzes transcripts.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "openai/gpt-3.5-turbo".to_string(),
            max_tokens: 3000,
            temperature: 0.8,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub sender_email: Option<String>,
    pub sender_password: Option<String>,
}

/// Mailbox watcher settings. Present only when Google credentials are configured.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub credentials_json: String,
    pub interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = CompletionConfig::default();
        let completion = CompletionConfig {
            api_key: optional_env("OPENROUTER_API_KEY"),
            base_url: optional_env("OPENROUTER_BASE_URL").unwrap_or(defaults.base_url),
            model: optional_env("COMPLETION_MODEL").unwrap_or(defaults.model),
            max_tokens: parse_env("COMPLETION_MAX_TOKENS", defaults.max_tokens)?,
            temperature: parse_env("COMPLETION_TEMPERATURE", defaults.temperature)?,
            timeout_secs: parse_env("COMPLETION_TIMEOUT_SECS", defaults.timeout_secs)?,
        };

        let score_policy = match optional_env("UNPARSABLE_SCORE_POLICY") {
            Some(raw) => raw
                .parse::<UnparsableScorePolicy>()
                .map_err(anyhow::Error::msg)
                .context("UNPARSABLE_SCORE_POLICY must be 'exclude' or 'zero'")?,
            None => UnparsableScorePolicy::default(),
        };

        let watcher = match optional_env("GOOGLE_CREDENTIALS_JSON") {
            Some(credentials_json) => Some(WatcherConfig {
                credentials_json,
                interval_secs: parse_env("WATCHER_INTERVAL_SECS", 3600)?,
            }),
            None => None,
        };

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            completion,
            report_output_dir: optional_env("REPORT_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static/reports")),
            upload_max_bytes: parse_env("UPLOAD_MAX_BYTES", 5 * 1024 * 1024)?,
            score_policy,
            smtp: SmtpConfig {
                host: optional_env("SMTP_HOST").unwrap_or_else(|| "smtp.gmail.com".to_string()),
                sender_email: optional_env("SENDER_EMAIL"),
                sender_password: optional_env("SENDER_PASSWORD"),
            },
            watcher,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns the variable's value, treating unset and blank the same.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
