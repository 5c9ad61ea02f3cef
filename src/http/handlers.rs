use super::state::AppState;
use crate::capture::FinalizedAudio;
use crate::error::PipelineError;
use crate::extraction::{EncounterRecord, ExtractionOutcome};
use crate::transcription::TranscriptionResult;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcription: String,
}

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub transcription: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetailResponse {
    pub error: String,
    pub details: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialDataResponse {
    pub error: String,
    pub partial_data: EncounterRecord,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /transcribe
/// Transcribe an uploaded audio payload
pub async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut audio: Option<FinalizedAudio> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("audio") {
            continue;
        }

        // An absent MIME type is a caller error, not a service error
        let Some(mime_type) = field.content_type().map(str::to_string) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Audio field is missing a MIME type".to_string(),
                }),
            )
                .into_response();
        };

        match field.bytes().await {
            Ok(bytes) => {
                audio = Some(FinalizedAudio::from_upload(bytes.to_vec(), mime_type));
            }
            Err(e) => {
                error!("Failed to read audio field: {}", e);
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "Failed to read audio upload".to_string(),
                    }),
                )
                    .into_response();
            }
        }
    }

    let Some(audio) = audio.filter(|a| !a.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No audio file provided".to_string(),
            }),
        )
            .into_response();
    };

    info!(
        "Transcribing uploaded audio: {} bytes ({})",
        audio.bytes.len(),
        audio.mime_type
    );

    match state.transcription.transcribe(&audio).await {
        TranscriptionResult::Transcript(transcription) => {
            (StatusCode::OK, Json(TranscribeResponse { transcription })).into_response()
        }
        TranscriptionResult::Failed { detail } => {
            error!("Transcription failed: {}", detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorDetailResponse {
                    error: "Transcription failed".to_string(),
                    details: detail,
                }),
            )
                .into_response()
        }
    }
}

/// POST /extract
/// Extract the structured record from a transcript
pub async fn extract(
    State(state): State<AppState>,
    Json(req): Json<ExtractRequest>,
) -> impl IntoResponse {
    let transcription = req.transcription.unwrap_or_default();

    match state.extraction.extract(&transcription).await {
        Ok(ExtractionOutcome::Complete(record)) => (StatusCode::OK, Json(record)).into_response(),

        Ok(ExtractionOutcome::Partial {
            record,
            missing_fields,
        }) => (
            StatusCode::BAD_REQUEST,
            Json(PartialDataResponse {
                error: format!(
                    "Missing data: {}. Please provide more information.",
                    missing_fields.join(", ")
                ),
                partial_data: record,
            }),
        )
            .into_response(),

        Ok(ExtractionOutcome::Failed { reason }) => {
            error!("Extraction failed: {}", reason);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to process transcription".to_string(),
                }),
            )
                .into_response()
        }

        Err(PipelineError::InvalidInput) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No transcription provided".to_string(),
            }),
        )
            .into_response(),

        Err(e) => {
            error!("Extraction error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
