use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::backend::{CaptureConfig, CaptureDevice, PcmFrame};

/// Capture device backed by a WAV file.
///
/// Streams the file's samples as fixed-duration PCM frames, then closes the
/// channel. Used for batch processing and as a stand-in device in tests.
pub struct WavFileDevice {
    path: String,
    config: CaptureConfig,
    capturing: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl WavFileDevice {
    pub fn new(path: String, config: CaptureConfig) -> Self {
        Self {
            path,
            config,
            capturing: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for WavFileDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<PcmFrame>> {
        let mut reader = hound::WavReader::open(&self.path)
            .with_context(|| format!("Failed to open WAV file: {}", self.path))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .samples::<i16>()
            .collect::<std::result::Result<_, _>>()
            .context("Failed to read WAV samples")?;

        info!(
            "WAV file device opened: {} ({} Hz, {} channel(s), {} samples)",
            self.path,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        let samples_per_frame = (spec.sample_rate as u64 * self.config.buffer_duration_ms / 1000)
            as usize
            * spec.channels as usize;
        let samples_per_frame = samples_per_frame.max(1);

        let (tx, rx) = mpsc::channel(100);
        let capturing = Arc::clone(&self.capturing);
        capturing.store(true, Ordering::SeqCst);

        let frame_duration_ms = self.config.buffer_duration_ms;
        let task = tokio::spawn(async move {
            let mut timestamp_ms = 0u64;

            for chunk in samples.chunks(samples_per_frame) {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                let frame = PcmFrame {
                    samples: chunk.to_vec(),
                    sample_rate: spec.sample_rate,
                    channels: spec.channels,
                    timestamp_ms,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }

                timestamp_ms += frame_duration_ms;
            }

            capturing.store(false, Ordering::SeqCst);
        });

        self.task = Some(task);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.capturing.store(false, Ordering::SeqCst);

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}
