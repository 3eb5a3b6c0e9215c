//! Error types for the core crate.

use crate::transcript::TranscriptError;
use maeum_rs_protocol::SpeechError;
use thiserror::Error;

/// Errors returned by orchestration and chat operations.
#[derive(Debug, Error)]
pub enum MaeumCoreError {
    /// Caller input was rejected before any work was done.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The response generator failed; fatal for the request.
    #[error("generation failed: {0}")]
    Generation(String),
    /// Local transcript store error.
    #[error("transcript error: {0}")]
    Transcript(#[from] TranscriptError),
    /// Speech collaborator error.
    #[error("speech error: {0}")]
    Speech(#[from] SpeechError),
    /// Voice and TTS routes need a speech endpoint.
    #[error("speech services are not configured")]
    SpeechUnavailable,
    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Startup wiring failed.
    #[error("setup error: {0}")]
    Setup(String),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
