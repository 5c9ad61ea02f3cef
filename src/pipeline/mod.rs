//! Pipeline orchestrator
//!
//! Sequences capture -> transcription -> extraction and maps every terminal
//! state to a caller-facing outcome. A single in-flight flag prevents a new
//! recording from starting while a prior recording is still being processed.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::capture::{CaptureConfig, CaptureDevice, FinalizedAudio, Recorder, RecorderState};
use crate::error::{PipelineError, PipelineResult};
use crate::extraction::{ExtractionClient, ExtractionOutcome};
use crate::transcription::{TranscriptionClient, TranscriptionResult};

/// Produces a fresh capture device for each recording session.
pub type DeviceFactory = Box<dyn Fn() -> Result<Box<dyn CaptureDevice>> + Send + Sync>;

/// Terminal result of one recording run through both pipeline stages.
///
/// `extraction` is `Complete` or `Partial`; a transport-level extraction
/// failure surfaces as `PipelineError::ExtractionFailed` instead, keeping
/// "service unreachable" distinct from "service responded incompletely".
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub transcription: String,
    pub extraction: ExtractionOutcome,
}

/// Orchestrates one recording session at a time.
pub struct EncounterPipeline {
    recorder: Mutex<Option<Recorder>>,
    transcription: TranscriptionClient,
    extraction: ExtractionClient,
    device_factory: DeviceFactory,
    capture_config: CaptureConfig,
    processing: Arc<AtomicBool>,
}

/// Clears the in-flight flag on every exit path out of processing.
struct ProcessingGuard(Arc<AtomicBool>);

impl ProcessingGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for ProcessingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl EncounterPipeline {
    pub fn new(
        transcription: TranscriptionClient,
        extraction: ExtractionClient,
        device_factory: DeviceFactory,
        capture_config: CaptureConfig,
    ) -> Self {
        Self {
            recorder: Mutex::new(None),
            transcription,
            extraction,
            device_factory,
            capture_config,
            processing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a prior recording is still being transcribed or extracted.
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    pub async fn state(&self) -> RecorderState {
        match self.recorder.lock().await.as_ref() {
            Some(recorder) => recorder.state(),
            None => RecorderState::Idle,
        }
    }

    pub async fn elapsed_secs(&self) -> u64 {
        match self.recorder.lock().await.as_ref() {
            Some(recorder) => recorder.elapsed_secs(),
            None => 0,
        }
    }

    /// Acquire a fresh device and start recording.
    ///
    /// Refused with `Busy` while a capture is live or a prior recording is
    /// still being processed.
    pub async fn start_recording(&self) -> PipelineResult<()> {
        if self.is_processing() {
            return Err(PipelineError::Busy);
        }

        let mut slot = self.recorder.lock().await;
        if slot.as_ref().is_some_and(|r| r.is_active()) {
            return Err(PipelineError::Busy);
        }

        let device = (self.device_factory)()
            .map_err(|e| PipelineError::DeviceUnavailable(e.to_string()))?;

        let mut recorder = Recorder::new(device, self.capture_config.clone());
        recorder.start().await?;

        *slot = Some(recorder);

        Ok(())
    }

    pub async fn pause(&self) {
        if let Some(recorder) = self.recorder.lock().await.as_mut() {
            recorder.pause();
        }
    }

    pub async fn resume(&self) {
        if let Some(recorder) = self.recorder.lock().await.as_mut() {
            recorder.resume();
        }
    }

    /// Stop the capture and run the two-stage pipeline on the result.
    ///
    /// Returns `Ok(None)` when nothing was recording. Transcription failure
    /// short-circuits: the extraction service is never invoked for it.
    pub async fn finish(&self) -> PipelineResult<Option<PipelineOutcome>> {
        let recorder = self.recorder.lock().await.take();

        let Some(mut recorder) = recorder else {
            return Ok(None);
        };

        let Some(audio) = recorder.stop().await? else {
            return Ok(None);
        };

        let _guard =
            ProcessingGuard::acquire(&self.processing).ok_or(PipelineError::Busy)?;

        self.process(audio).await.map(Some)
    }

    async fn process(&self, audio: FinalizedAudio) -> PipelineResult<PipelineOutcome> {
        info!(
            "Processing recording: {:.1}s of audio, {} bytes",
            audio.duration_secs,
            audio.bytes.len()
        );

        let transcript = match self.transcription.transcribe(&audio).await {
            TranscriptionResult::Transcript(text) => text,
            TranscriptionResult::Failed { detail } => {
                return Err(PipelineError::TranscriptionFailed(detail));
            }
        };

        match self.extraction.extract(&transcript).await? {
            ExtractionOutcome::Failed { reason } => Err(PipelineError::ExtractionFailed(reason)),
            extraction => Ok(PipelineOutcome {
                transcription: transcript,
                extraction,
            }),
        }
    }
}
