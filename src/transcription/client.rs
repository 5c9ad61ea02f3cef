use anyhow::{Context, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::capture::FinalizedAudio;
use crate::config::TranscriptionConfig;

/// Speech-to-text service abstraction.
///
/// One-shot, non-streaming: the full finalized payload goes out in a single
/// request and the call suspends until the service responds.
#[async_trait::async_trait]
pub trait TranscriptionService: Send + Sync {
    /// Transcribe a finalized audio payload to text.
    ///
    /// An empty transcript is a valid result (the service detected silence).
    async fn transcribe(&self, audio: &FinalizedAudio) -> Result<String>;

    /// Service name for logging
    fn name(&self) -> &str;
}

/// Result of one transcription attempt. Exactly one side is present.
#[derive(Debug, Clone)]
pub enum TranscriptionResult {
    /// Transcript text; may be empty if the service detected silence
    Transcript(String),
    /// Transport or service error, with the service diagnostic when available
    Failed { detail: String },
}

/// Packages finalized audio for the transcription service and normalizes
/// every response or error into a `TranscriptionResult`. Never returns `Err`
/// past this boundary.
#[derive(Clone)]
pub struct TranscriptionClient {
    service: Arc<dyn TranscriptionService>,
}

impl TranscriptionClient {
    pub fn new(service: Arc<dyn TranscriptionService>) -> Self {
        Self { service }
    }

    pub async fn transcribe(&self, audio: &FinalizedAudio) -> TranscriptionResult {
        if audio.is_empty() {
            return TranscriptionResult::Failed {
                detail: "No audio provided".to_string(),
            };
        }

        match self.service.transcribe(audio).await {
            Ok(transcript) => {
                info!(
                    "Transcription complete via {}: {} chars",
                    self.service.name(),
                    transcript.len()
                );
                TranscriptionResult::Transcript(transcript)
            }
            Err(e) => {
                error!("Transcription failed via {}: {:#}", self.service.name(), e);
                TranscriptionResult::Failed {
                    detail: format!("{:#}", e),
                }
            }
        }
    }
}

/// HTTP transcription service (Deepgram-style pre-recorded endpoint).
///
/// The audio goes out as the raw request body with its declared MIME type;
/// model options are passed as query parameters.
pub struct HttpTranscriptionService {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    results: SttResults,
}

#[derive(Debug, Deserialize)]
struct SttResults {
    channels: Vec<SttChannel>,
}

#[derive(Debug, Deserialize)]
struct SttChannel {
    alternatives: Vec<SttAlternative>,
}

#[derive(Debug, Deserialize)]
struct SttAlternative {
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct SttError {
    err_msg: Option<String>,
    error: Option<String>,
}

impl HttpTranscriptionService {
    pub fn new(client: reqwest::Client, config: TranscriptionConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl TranscriptionService for HttpTranscriptionService {
    async fn transcribe(&self, audio: &FinalizedAudio) -> Result<String> {
        let smart_format = if self.config.smart_format {
            "true"
        } else {
            "false"
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .query(&[
                ("model", self.config.model.as_str()),
                ("smart_format", smart_format),
            ])
            .header(AUTHORIZATION, format!("Token {}", self.config.api_key))
            .header(CONTENT_TYPE, audio.mime_type.clone())
            .body(audio.bytes.clone())
            .send()
            .await
            .context("Transcription request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            // Surface the service's own diagnostic when it sent one
            let detail = serde_json::from_str::<SttError>(&body)
                .ok()
                .and_then(|e| e.err_msg.or(e.error))
                .unwrap_or(body);

            anyhow::bail!("Transcription service returned {}: {}", status, detail);
        }

        let parsed: SttResponse = response
            .json()
            .await
            .context("Malformed transcription response")?;

        let transcript = parsed
            .results
            .channels
            .first()
            .and_then(|c| c.alternatives.first())
            .map(|a| a.transcript.clone())
            .context("Transcription response contained no alternatives")?;

        Ok(transcript)
    }

    fn name(&self) -> &str {
        "http-stt"
    }
}
