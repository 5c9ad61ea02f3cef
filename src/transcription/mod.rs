//! Speech-to-text client
//!
//! Wraps the remote transcription service behind a trait seam and folds
//! every response or failure into a single `TranscriptionResult` shape.

mod client;

pub use client::{
    HttpTranscriptionService, TranscriptionClient, TranscriptionResult, TranscriptionService,
};
