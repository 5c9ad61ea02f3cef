use anyhow::{Context, Result};
use chartnote::extraction::{ExtractionClient, HttpExtractionService};
use chartnote::transcription::{HttpTranscriptionService, TranscriptionClient};
use chartnote::{create_router, AppState, Config};
use clap::Parser;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "chartnote", about = "Voice-dictated patient encounter capture")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(long, default_value = "config/chartnote")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!(
        "Transcription service: {} (model {})",
        cfg.transcription.endpoint, cfg.transcription.model
    );
    info!(
        "Extraction service: {} (model {})",
        cfg.extraction.endpoint, cfg.extraction.model
    );
    info!(
        "Capture format: {} Hz, {} channel(s)",
        cfg.audio.sample_rate, cfg.audio.channels
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(60))
        .build()
        .context("Failed to build HTTP client")?;

    let transcription = TranscriptionClient::new(Arc::new(HttpTranscriptionService::new(
        client.clone(),
        cfg.transcription.clone(),
    )));
    let extraction = ExtractionClient::new(Arc::new(HttpExtractionService::new(
        client,
        cfg.extraction.clone(),
    )));

    let state = AppState::new(transcription, extraction);
    let app = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
