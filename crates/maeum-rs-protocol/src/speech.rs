use crate::EmotionAnalysis;
use async_trait::async_trait;

/// Errors returned by speech collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// The collaborator could not be reached.
    #[error("speech service unavailable: {0}")]
    Unavailable(String),
    /// The collaborator answered with an error.
    #[error("speech service failed: {0}")]
    Failed(String),
    /// The collaborator answered with an unexpected payload.
    #[error("invalid speech response: {0}")]
    InvalidResponse(String),
    /// Audio contained no recognizable speech.
    #[error("no speech recognized")]
    EmptyTranscript,
}

/// Speech-to-text collaborator.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe encoded audio into text.
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SpeechError>;
}

/// Speech emotion classifier collaborator.
#[async_trait]
pub trait EmotionClassifier: Send + Sync {
    /// Predict the `top_k` most likely emotions for encoded audio.
    async fn predict(&self, audio: &[u8], top_k: usize) -> Result<EmotionAnalysis, SpeechError>;
}

/// Text-to-speech collaborator.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize text into WAV bytes.
    async fn synthesize(&self, text: &str, speed: f32) -> Result<Vec<u8>, SpeechError>;
}
