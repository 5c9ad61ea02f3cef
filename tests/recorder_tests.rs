// Integration tests for the recording state machine
//
// These tests verify the Idle -> Recording -> Paused -> Stopping -> Stopped
// transitions, the elapsed-time ticker, and the device release guarantees.

use anyhow::Result;
use chartnote::capture::{CaptureConfig, CaptureDevice, PcmFrame, Recorder, RecorderState};
use chartnote::error::PipelineError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Capture device double: serves canned frames and counts stop calls.
struct FakeDevice {
    frames: Vec<PcmFrame>,
    stop_calls: Arc<AtomicUsize>,
    fail_start: bool,
    tx: Option<mpsc::Sender<PcmFrame>>,
}

impl FakeDevice {
    fn new(frames: Vec<PcmFrame>, stop_calls: Arc<AtomicUsize>) -> Self {
        Self {
            frames,
            stop_calls,
            fail_start: false,
            tx: None,
        }
    }

    fn failing(stop_calls: Arc<AtomicUsize>) -> Self {
        Self {
            frames: Vec::new(),
            stop_calls,
            fail_start: true,
            tx: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureDevice for FakeDevice {
    async fn start(&mut self) -> Result<mpsc::Receiver<PcmFrame>> {
        if self.fail_start {
            anyhow::bail!("microphone permission denied");
        }

        let (tx, rx) = mpsc::channel(100);
        for frame in self.frames.clone() {
            tx.send(frame).await?;
        }

        // Keep the sender alive until stop() so the channel behaves like a
        // live capture stream.
        self.tx = Some(tx);

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.tx = None;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "fake"
    }
}

fn frame(samples: usize, timestamp_ms: u64) -> PcmFrame {
    PcmFrame {
        samples: vec![100i16; samples],
        sample_rate: 16000,
        channels: 1,
        timestamp_ms,
    }
}

async fn advance_secs(n: u64) {
    for _ in 0..n {
        // Let freshly spawned ticker tasks register their timer before the
        // clock moves, then let them observe the tick.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_stop_finalizes_buffered_audio() -> Result<()> {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::new(vec![frame(1600, 0), frame(1600, 100)], stop_calls.clone());

    let mut recorder = Recorder::new(Box::new(device), CaptureConfig::default());
    recorder.start().await?;
    assert_eq!(recorder.state(), RecorderState::Recording);
    assert!(recorder.started_at().is_some());

    let audio = recorder.stop().await?.expect("should produce audio");

    assert_eq!(recorder.state(), RecorderState::Stopped);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
    assert_eq!(audio.mime_type, "audio/wav");
    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);

    // 3200 samples at 16kHz mono = 200ms
    assert!((audio.duration_secs - 0.2).abs() < 1e-9);

    // The payload must be a readable WAV container with every sample intact
    let reader = hound::WavReader::new(std::io::Cursor::new(audio.bytes))?;
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.len(), 3200);

    Ok(())
}

#[tokio::test]
async fn test_stop_releases_device_exactly_once_even_when_finalization_fails() -> Result<()> {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::new(Vec::new(), stop_calls.clone());

    // A zero sample rate makes WAV finalization fail after the device has
    // already been released.
    let config = CaptureConfig {
        sample_rate: 0,
        channels: 1,
        buffer_duration_ms: 100,
    };

    let mut recorder = Recorder::new(Box::new(device), config);
    recorder.start().await?;

    let err = recorder.stop().await.expect_err("finalization should fail");
    assert!(matches!(err, PipelineError::CaptureFailed(_)));

    assert_eq!(recorder.state(), RecorderState::Stopped);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);

    // A second stop is a no-op and must not release the device again
    assert!(recorder.stop().await?.is_none());
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_start_failure_leaves_recorder_idle() {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::failing(stop_calls.clone());

    let mut recorder = Recorder::new(Box::new(device), CaptureConfig::default());

    let err = recorder.start().await.expect_err("acquisition should fail");
    assert!(matches!(err, PipelineError::DeviceUnavailable(_)));
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.elapsed_secs(), 0);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_pause_when_idle_is_noop() {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::new(Vec::new(), stop_calls);

    let mut recorder = Recorder::new(Box::new(device), CaptureConfig::default());

    recorder.pause();
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(recorder.elapsed_secs(), 0);

    recorder.resume();
    assert_eq!(recorder.state(), RecorderState::Idle);
}

#[tokio::test]
async fn test_pause_when_stopped_is_noop() -> Result<()> {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::new(vec![frame(160, 0)], stop_calls.clone());

    let mut recorder = Recorder::new(Box::new(device), CaptureConfig::default());
    recorder.start().await?;
    recorder.stop().await?;

    recorder.pause();
    assert_eq!(recorder.state(), RecorderState::Stopped);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test]
async fn test_stop_before_start_is_noop() -> Result<()> {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::new(Vec::new(), stop_calls.clone());

    let mut recorder = Recorder::new(Box::new(device), CaptureConfig::default());

    assert!(recorder.stop().await?.is_none());
    assert_eq!(recorder.state(), RecorderState::Idle);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_ticks_only_while_recording() -> Result<()> {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::new(Vec::new(), stop_calls);

    let mut recorder = Recorder::new(Box::new(device), CaptureConfig::default());
    recorder.start().await?;
    assert_eq!(recorder.elapsed_secs(), 0);

    advance_secs(3).await;
    assert_eq!(recorder.elapsed_secs(), 3);

    // Paused: the count is retained but does not advance
    recorder.pause();
    advance_secs(5).await;
    assert_eq!(recorder.elapsed_secs(), 3);

    recorder.resume();
    advance_secs(2).await;
    assert_eq!(recorder.elapsed_secs(), 5);

    // Observers see the same count through the watch channel
    assert_eq!(*recorder.elapsed_watch().borrow(), 5);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_from_paused_releases_device() -> Result<()> {
    let stop_calls = Arc::new(AtomicUsize::new(0));
    let device = FakeDevice::new(vec![frame(1600, 0)], stop_calls.clone());

    let mut recorder = Recorder::new(Box::new(device), CaptureConfig::default());
    recorder.start().await?;

    advance_secs(2).await;
    recorder.pause();
    assert_eq!(recorder.state(), RecorderState::Paused);

    let audio = recorder.stop().await?.expect("should produce audio");

    assert_eq!(recorder.state(), RecorderState::Stopped);
    assert_eq!(stop_calls.load(Ordering::SeqCst), 1);
    assert!(!audio.is_empty());

    // The elapsed count resets once the session is destroyed
    assert_eq!(recorder.elapsed_secs(), 0);

    Ok(())
}

#[tokio::test]
async fn test_wav_file_device_feeds_recorder() -> Result<()> {
    use chartnote::capture::{CaptureDeviceFactory, CaptureSource};

    let temp_dir = tempfile::TempDir::new()?;
    let wav_path = temp_dir.path().join("dictation.wav");

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav_path, spec)?;
    for i in 0..8000 {
        writer.write_sample((i % 128) as i16)?;
    }
    writer.finalize()?;

    let device = CaptureDeviceFactory::create(
        CaptureSource::File(wav_path.to_string_lossy().to_string()),
        CaptureConfig::default(),
    )?;

    let mut recorder = Recorder::new(device, CaptureConfig::default());
    recorder.start().await?;

    // Give the file device time to stream all frames through the buffer
    tokio::time::sleep(Duration::from_millis(50)).await;

    let audio = recorder.stop().await?.expect("should produce audio");

    // 8000 samples at 16kHz = 0.5s
    assert!((audio.duration_secs - 0.5).abs() < 1e-9);

    let reader = hound::WavReader::new(std::io::Cursor::new(audio.bytes))?;
    assert_eq!(reader.len(), 8000);

    Ok(())
}
