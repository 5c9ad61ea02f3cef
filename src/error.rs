use thiserror::Error;

/// Failure taxonomy for the capture-and-extraction pipeline.
///
/// Every variant is a reportable, non-fatal outcome: nothing here should
/// escape a component boundary as a panic. Partial extraction is NOT an
/// error and lives in `ExtractionOutcome` instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The capture device could not be acquired (permission denied, no
    /// device present). The session remains idle; the user must retry.
    #[error("Capture device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Buffered audio could not be finalized into a playable payload.
    #[error("Audio capture failed: {0}")]
    CaptureFailed(String),

    /// Transport or service error during speech-to-text. Retryable by
    /// re-recording.
    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    /// Empty or whitespace-only transcript; rejected before any remote
    /// extraction call is made.
    #[error("No transcription provided")]
    InvalidInput,

    /// Transport or service error during structured extraction. Distinct
    /// from a partial extraction, where the service responded but some
    /// fields were absent.
    #[error("Failed to process transcription: {0}")]
    ExtractionFailed(String),

    /// A previous recording is still being transcribed or extracted.
    #[error("A previous recording is still being processed")]
    Busy,
}

pub type PipelineResult<T> = Result<T, PipelineError>;
