use anyhow::{Context, Result};
use std::io::Cursor;

/// MIME type declared to the transcription service for finalized audio.
pub const WAV_MIME: &str = "audio/wav";

/// The complete, contiguous audio payload assembled once recording stops
/// and all buffered chunks are combined.
#[derive(Debug, Clone)]
pub struct FinalizedAudio {
    /// Encoded WAV bytes
    pub bytes: Vec<u8>,
    /// Declared MIME type; the transcription service requires this
    pub mime_type: String,
    /// Sample rate of the encoded audio
    pub sample_rate: u32,
    /// Channel count of the encoded audio
    pub channels: u16,
    /// Payload duration in seconds
    pub duration_secs: f64,
}

impl FinalizedAudio {
    /// Wrap an already-encoded payload uploaded by a remote client.
    ///
    /// Sample rate, channel count, and duration are unknown for uploads
    /// and carried as zero; only the bytes and MIME type go to the
    /// transcription service.
    pub fn from_upload(bytes: Vec<u8>, mime_type: String) -> Self {
        Self {
            bytes,
            mime_type,
            sample_rate: 0,
            channels: 0,
            duration_secs: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Combine ordered PCM chunks into a single in-memory WAV payload.
pub fn finalize_chunks(
    chunks: &[Vec<i16>],
    sample_rate: u32,
    channels: u16,
) -> Result<FinalizedAudio> {
    if sample_rate == 0 || channels == 0 {
        anyhow::bail!(
            "invalid audio format: {} Hz, {} channel(s)",
            sample_rate,
            channels
        );
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .context("Failed to create WAV writer")?;

        for chunk in chunks {
            for &sample in chunk {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
        }

        writer.finalize().context("Failed to finalize WAV payload")?;
    }

    let sample_count: usize = chunks.iter().map(|c| c.len()).sum();
    let duration_secs = sample_count as f64 / (sample_rate as f64 * channels as f64);

    Ok(FinalizedAudio {
        bytes: cursor.into_inner(),
        mime_type: WAV_MIME.to_string(),
        sample_rate,
        channels,
        duration_secs,
    })
}
