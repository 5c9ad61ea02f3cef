//! Audio capture: device abstraction and the recording state machine
//!
//! The `Recorder` owns the capture device handle for one session and
//! guarantees the device is released exactly once, on every exit path.

pub mod backend;
pub mod file;
pub mod recorder;
pub mod wav;

pub use backend::{CaptureConfig, CaptureDevice, CaptureDeviceFactory, CaptureSource, PcmFrame};
pub use file::WavFileDevice;
pub use recorder::{Recorder, RecorderState};
pub use wav::{FinalizedAudio, WAV_MIME};
