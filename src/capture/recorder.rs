use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::backend::{CaptureConfig, CaptureDevice};
use super::wav::{self, FinalizedAudio};
use crate::error::{PipelineError, PipelineResult};

/// Recorder lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// No device acquired yet
    Idle,
    /// Capturing audio; elapsed-time ticker running
    Recording,
    /// Buffering suspended; elapsed count retained
    Paused,
    /// Draining buffered frames and releasing the device
    Stopping,
    /// Terminal; device released and chunks consumed
    Stopped,
}

/// Single-owner recording session.
///
/// Owns the capture device handle for its lifetime and drives the
/// Idle -> Recording -> Paused -> Stopping -> Stopped state machine. The
/// device and its hardware stream are released exactly once, on every exit
/// path out of `Recording`/`Paused`, before audio finalization is attempted.
pub struct Recorder {
    session_id: Uuid,
    state: RecorderState,
    config: CaptureConfig,
    started_at: Option<DateTime<Utc>>,

    /// The one exclusively-owned shared resource. `None` after release.
    device: Option<Box<dyn CaptureDevice>>,

    /// Ordered PCM chunks buffered while recording
    chunks: Arc<Mutex<Vec<Vec<i16>>>>,

    /// Gate for the buffering task; cleared while paused
    buffering: Arc<AtomicBool>,

    /// Format observed on captured frames (0 = no frame seen yet)
    observed_rate: Arc<AtomicU32>,
    observed_channels: Arc<AtomicU16>,

    /// Whole seconds elapsed while recording
    elapsed: Arc<AtomicU64>,
    elapsed_tx: watch::Sender<u64>,

    ticker: Option<JoinHandle<()>>,
    capture_task: Option<JoinHandle<()>>,
}

impl Recorder {
    /// Create a recorder that will drive the given device.
    pub fn new(device: Box<dyn CaptureDevice>, config: CaptureConfig) -> Self {
        let (elapsed_tx, _) = watch::channel(0u64);

        Self {
            session_id: Uuid::new_v4(),
            state: RecorderState::Idle,
            config,
            started_at: None,
            device: Some(device),
            chunks: Arc::new(Mutex::new(Vec::new())),
            buffering: Arc::new(AtomicBool::new(false)),
            observed_rate: Arc::new(AtomicU32::new(0)),
            observed_channels: Arc::new(AtomicU16::new(0)),
            elapsed: Arc::new(AtomicU64::new(0)),
            elapsed_tx,
            ticker: None,
            capture_task: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    /// When the session entered `Recording`, if it has.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Whether the recorder holds a live capture (recording or paused).
    pub fn is_active(&self) -> bool {
        matches!(self.state, RecorderState::Recording | RecorderState::Paused)
    }

    /// Whole seconds spent in `Recording` so far.
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// Observe elapsed-time ticks; updated once per second while recording.
    pub fn elapsed_watch(&self) -> watch::Receiver<u64> {
        self.elapsed_tx.subscribe()
    }

    /// Acquire the device and begin capturing.
    ///
    /// Fails with `DeviceUnavailable` if the device cannot be acquired; the
    /// recorder stays `Idle` so the caller can retry.
    pub async fn start(&mut self) -> PipelineResult<()> {
        match self.state {
            RecorderState::Idle => {}
            RecorderState::Recording | RecorderState::Paused => {
                warn!("Recording already started (session {})", self.session_id);
                return Ok(());
            }
            RecorderState::Stopping | RecorderState::Stopped => {
                return Err(PipelineError::DeviceUnavailable(
                    "capture device already released".to_string(),
                ));
            }
        }

        let device = self.device.as_mut().ok_or_else(|| {
            PipelineError::DeviceUnavailable("capture device already released".to_string())
        })?;

        let mut rx = device
            .start()
            .await
            .map_err(|e| PipelineError::DeviceUnavailable(e.to_string()))?;

        info!(
            "Recording started (session {}, device {})",
            self.session_id,
            device.name()
        );

        self.buffering.store(true, Ordering::SeqCst);

        let chunks = Arc::clone(&self.chunks);
        let buffering = Arc::clone(&self.buffering);
        let observed_rate = Arc::clone(&self.observed_rate);
        let observed_channels = Arc::clone(&self.observed_channels);

        self.capture_task = Some(tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                // Paused: frames are discarded, not buffered
                if !buffering.load(Ordering::SeqCst) {
                    continue;
                }

                observed_rate.store(frame.sample_rate, Ordering::SeqCst);
                observed_channels.store(frame.channels, Ordering::SeqCst);

                chunks.lock().await.push(frame.samples);
            }

            debug!("Capture buffering task finished");
        }));

        self.ticker = Some(self.spawn_ticker());
        self.started_at = Some(Utc::now());
        self.state = RecorderState::Recording;

        Ok(())
    }

    /// Suspend buffering and the ticker, retaining the elapsed count.
    ///
    /// No-op outside `Recording`.
    pub fn pause(&mut self) {
        if self.state != RecorderState::Recording {
            debug!("pause() ignored in state {:?}", self.state);
            return;
        }

        self.buffering.store(false, Ordering::SeqCst);
        self.cancel_ticker();
        self.state = RecorderState::Paused;

        info!(
            "Recording paused at {}s (session {})",
            self.elapsed_secs(),
            self.session_id
        );
    }

    /// Resume buffering and restart the ticker.
    ///
    /// No-op outside `Paused`.
    pub fn resume(&mut self) {
        if self.state != RecorderState::Paused {
            debug!("resume() ignored in state {:?}", self.state);
            return;
        }

        self.buffering.store(true, Ordering::SeqCst);
        self.ticker = Some(self.spawn_ticker());
        self.state = RecorderState::Recording;

        info!("Recording resumed (session {})", self.session_id);
    }

    /// Stop recording, release the device, and finalize the buffered audio
    /// into one contiguous WAV payload.
    ///
    /// Returns `Ok(None)` with no side effects when not recording or paused.
    /// The device handle is released unconditionally, even if finalization
    /// fails.
    pub async fn stop(&mut self) -> PipelineResult<Option<FinalizedAudio>> {
        if !self.is_active() {
            debug!("stop() ignored in state {:?}", self.state);
            return Ok(None);
        }

        self.state = RecorderState::Stopping;
        self.cancel_ticker();

        // Release the device and its stream before anything that can fail.
        let mut device_stopped = false;
        if let Some(mut device) = self.device.take() {
            match device.stop().await {
                Ok(()) => device_stopped = true,
                Err(e) => warn!("Failed to stop capture device: {}", e),
            }
        }

        // Drain remaining frames: the channel closes once the device's
        // producer is gone. If the device failed to stop cleanly the channel
        // may never close, so cancel the task instead of waiting on it.
        if let Some(task) = self.capture_task.take() {
            if device_stopped {
                if let Err(e) = task.await {
                    warn!("Capture task panicked: {}", e);
                }
            } else {
                task.abort();
                let _ = task.await;
            }
        }

        self.buffering.store(false, Ordering::SeqCst);

        let chunks = {
            let mut guard = self.chunks.lock().await;
            std::mem::take(&mut *guard)
        };

        let elapsed = self.elapsed.swap(0, Ordering::SeqCst);
        let _ = self.elapsed_tx.send(0);

        let sample_rate = match self.observed_rate.load(Ordering::SeqCst) {
            0 => self.config.sample_rate,
            rate => rate,
        };
        let channels = match self.observed_channels.load(Ordering::SeqCst) {
            0 => self.config.channels,
            channels => channels,
        };

        let finalized = wav::finalize_chunks(&chunks, sample_rate, channels);
        self.state = RecorderState::Stopped;

        let audio =
            finalized.map_err(|e| PipelineError::CaptureFailed(e.to_string()))?;

        info!(
            "Recording stopped after {}s: {} chunks, {} bytes (session {})",
            elapsed,
            chunks.len(),
            audio.bytes.len(),
            self.session_id
        );

        Ok(Some(audio))
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let elapsed = Arc::clone(&self.elapsed);
        let tx = self.elapsed_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            // The first tick resolves immediately; consume it so the counter
            // advances once per full second.
            interval.tick().await;

            loop {
                interval.tick().await;
                let secs = elapsed.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = tx.send(secs);
            }
        })
    }

    fn cancel_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        self.cancel_ticker();

        if let Some(task) = self.capture_task.take() {
            task.abort();
        }
    }
}
