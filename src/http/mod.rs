//! HTTP surface between the user interface and the pipeline
//!
//! - POST /transcribe - multipart audio -> transcript
//! - POST /extract - transcript -> structured record (or partial data)
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
