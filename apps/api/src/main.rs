mod analysis;
mod config;
mod db;
mod delivery;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod report;
mod routes;
mod state;
mod transcripts;
mod watcher;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::delivery::SmtpMailer;
use crate::llm_client::OpenRouterClient;
use crate::pipeline::{FeedbackService, ReportPipeline};
use crate::report::ReportWriter;
use crate::routes::build_router;
use crate::state::AppState;
use crate::transcripts::PgTranscriptStore;
use crate::watcher::MailboxWatcher;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview feedback API v{}", env!("CARGO_PKG_VERSION"));

    let db = create_pool(&config.database_url).await?;

    let completion = OpenRouterClient::new(&config.completion)?;
    if config.completion.api_key.is_none() {
        tracing::warn!("OPENROUTER_API_KEY is not set; report requests will fail until it is");
    }
    info!("Completion client initialized (model: {})", completion.model());

    let writer = ReportWriter::new(&config.report_output_dir);
    info!("Reports will be written to {}", writer.output_dir().display());

    let transcripts = PgTranscriptStore::new(db.clone());
    let pipeline = Arc::new(ReportPipeline::new(
        Arc::new(completion),
        writer,
        config.score_policy,
    ));
    let feedback = Arc::new(FeedbackService::new(
        Arc::new(transcripts.clone()),
        pipeline.clone(),
        Arc::new(SmtpMailer::new(config.smtp.clone())),
    ));

    if let Some(watcher_config) = &config.watcher {
        let watcher = MailboxWatcher::from_config(watcher_config, feedback.clone())?;
        tokio::spawn(watcher.run());
    } else {
        info!("GOOGLE_CREDENTIALS_JSON not set; mailbox watcher disabled");
    }

    let state = AppState {
        config: config.clone(),
        transcripts,
        pipeline,
        feedback,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
