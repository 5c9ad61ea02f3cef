//! Structured extraction client
//!
//! Sends transcripts to the language-model extraction service via a forced
//! function call and computes the three-way complete/partial/failed verdict.

mod client;
mod record;

pub use client::{ExtractionClient, ExtractionService, HttpExtractionService, EXTRACT_FUNCTION};
pub use record::{
    EncounterRecord, ExtractionOutcome, FIRST_NAME_LABEL, LAST_NAME_LABEL, SUMMARY_LABEL,
};
