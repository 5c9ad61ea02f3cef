pub mod capture;
pub mod config;
pub mod error;
pub mod extraction;
pub mod http;
pub mod pipeline;
pub mod transcription;

pub use capture::{
    CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureSource, FinalizedAudio, PcmFrame,
    Recorder, RecorderState,
};
pub use config::Config;
pub use error::{PipelineError, PipelineResult};
pub use extraction::{EncounterRecord, ExtractionClient, ExtractionOutcome, ExtractionService};
pub use http::{create_router, AppState};
pub use pipeline::{DeviceFactory, EncounterPipeline, PipelineOutcome};
pub use transcription::{TranscriptionClient, TranscriptionResult, TranscriptionService};
