use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use super::record::{EncounterRecord, ExtractionOutcome};
use crate::config::ExtractionConfig;
use crate::error::{PipelineError, PipelineResult};

/// Name of the single function the extraction service is forced to invoke.
pub const EXTRACT_FUNCTION: &str = "extract_form_data";

/// Structured extraction service abstraction.
///
/// One request per transcript, returning the raw arguments object of the
/// forced function invocation.
#[async_trait::async_trait]
pub trait ExtractionService: Send + Sync {
    /// Ask the service to fill the three-field schema from the transcript.
    async fn extract_fields(&self, transcript: &str) -> Result<Value>;

    /// Service name for logging
    fn name(&self) -> &str;
}

/// Sends transcripts to the extraction service, validates the returned
/// fields, and computes the complete/partial verdict.
#[derive(Clone)]
pub struct ExtractionClient {
    service: Arc<dyn ExtractionService>,
}

impl ExtractionClient {
    pub fn new(service: Arc<dyn ExtractionService>) -> Self {
        Self { service }
    }

    /// Extract the structured record from a transcript.
    ///
    /// Empty or whitespace-only input is rejected with `InvalidInput`
    /// before any remote call. Transport and service failures fold into
    /// `ExtractionOutcome::Failed`, distinct from `Partial`.
    pub async fn extract(&self, transcript: &str) -> PipelineResult<ExtractionOutcome> {
        if transcript.trim().is_empty() {
            return Err(PipelineError::InvalidInput);
        }

        let arguments = match self.service.extract_fields(transcript).await {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!("Extraction failed via {}: {:#}", self.service.name(), e);
                return Ok(ExtractionOutcome::Failed {
                    reason: format!("{:#}", e),
                });
            }
        };

        let record = EncounterRecord::from_arguments(&arguments);
        let missing = record.missing_fields();

        if missing.is_empty() {
            info!("Extraction complete via {}", self.service.name());
            Ok(ExtractionOutcome::Complete(record))
        } else {
            info!(
                "Extraction partial via {}: missing {}",
                self.service.name(),
                missing.join(", ")
            );
            Ok(ExtractionOutcome::Partial {
                record,
                missing_fields: missing,
            })
        }
    }
}

/// HTTP extraction service (OpenAI-style chat completions endpoint).
///
/// Declares a single `extract_form_data` function with the three required
/// fields and forces the model to invoke it, so the response is always a
/// schema-constrained arguments object rather than free text.
pub struct HttpExtractionService {
    client: reqwest::Client,
    config: ExtractionConfig,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    arguments: Option<String>,
}

impl HttpExtractionService {
    pub fn new(client: reqwest::Client, config: ExtractionConfig) -> Self {
        Self { client, config }
    }

    fn request_body(&self, transcript: &str) -> Value {
        json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": transcript }],
            "functions": [{
                "name": EXTRACT_FUNCTION,
                "description": "Extract form data from the transcription",
                "parameters": {
                    "type": "object",
                    "properties": {
                        "firstName": { "type": "string" },
                        "lastName": { "type": "string" },
                        "summary": { "type": "string" },
                    },
                    "required": ["firstName", "lastName", "summary"],
                },
            }],
            "function_call": { "name": EXTRACT_FUNCTION },
        })
    }
}

#[async_trait::async_trait]
impl ExtractionService for HttpExtractionService {
    async fn extract_fields(&self, transcript: &str) -> Result<Value> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(transcript))
            .send()
            .await
            .context("Extraction request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Extraction service returned {}: {}", status, body);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Malformed extraction response")?;

        let arguments = parsed
            .choices
            .first()
            .and_then(|c| c.message.function_call.as_ref())
            .and_then(|f| f.arguments.as_deref())
            .unwrap_or("{}");

        // Malformed arguments mean "nothing extracted", not a failure
        Ok(serde_json::from_str(arguments).unwrap_or_else(|e| {
            warn!("Unparsable function arguments: {}", e);
            json!({})
        }))
    }

    fn name(&self) -> &str {
        "http-extraction"
    }
}
