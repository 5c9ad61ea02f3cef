use anyhow::Result;
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct PcmFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a capture device
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate for captured audio
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Buffer size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz mono keeps STT payloads small
            channels: 1,
            buffer_duration_ms: 100,
        }
    }
}

/// Capture device abstraction
///
/// The device is the one exclusively-owned hardware resource in the
/// pipeline. Only the recorder that owns it may start or stop it, and
/// `stop` must release the underlying stream.
///
/// Implementations:
/// - WAV file playback (testing/batch processing)
/// - OS microphone backends, added per platform
#[async_trait::async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire the device and begin capturing.
    ///
    /// Returns a channel receiver that will receive PCM frames until the
    /// device is stopped or the source is exhausted.
    async fn start(&mut self) -> Result<mpsc::Receiver<PcmFrame>>;

    /// Stop capturing and release the underlying stream.
    async fn stop(&mut self) -> Result<()>;

    /// Check if the device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Capture source type
#[derive(Debug, Clone)]
pub enum CaptureSource {
    /// Live microphone input
    Microphone,
    /// Pre-recorded WAV file (for testing/batch processing)
    File(String),
}

/// Capture device factory
pub struct CaptureDeviceFactory;

impl CaptureDeviceFactory {
    /// Create a capture device for the given source.
    pub fn create(source: CaptureSource, config: CaptureConfig) -> Result<Box<dyn CaptureDevice>> {
        match source {
            CaptureSource::Microphone => {
                anyhow::bail!("No microphone backend is available on this platform")
            }

            CaptureSource::File(path) => {
                use super::file::WavFileDevice;
                let device = WavFileDevice::new(path, config);
                Ok(Box::new(device))
            }
        }
    }
}
