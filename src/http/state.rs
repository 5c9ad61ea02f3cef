use crate::extraction::ExtractionClient;
use crate::transcription::TranscriptionClient;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub transcription: TranscriptionClient,
    pub extraction: ExtractionClient,
}

impl AppState {
    pub fn new(transcription: TranscriptionClient, extraction: ExtractionClient) -> Self {
        Self {
            transcription,
            extraction,
        }
    }
}
