//! Application context built once at startup.

use crate::chat::{ChatService, SpeechServices};
use crate::error::MaeumCoreError;
use crate::generator::{LlmResponseGenerator, ResponseGenerator};
use crate::orchestrator::TurnOrchestrator;
use crate::speech::SpeechClient;
use crate::transcript::{SqliteTranscriptStore, TranscriptStore};
use log::{info, warn};
use maeum_rs_config::MaeumConfig;
use std::path::PathBuf;
use std::sync::Arc;

/// Immutable handles shared by every request handler.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<MaeumConfig>,
    chat: ChatService,
    transcripts: Arc<dyn TranscriptStore>,
}

impl AppContext {
    /// Assemble a context from already-built parts.
    pub fn new(
        config: MaeumConfig,
        chat: ChatService,
        transcripts: Arc<dyn TranscriptStore>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            chat,
            transcripts,
        }
    }

    /// Build every collaborator from config: transcript store, memory
    /// variant, chat model provider and the optional speech client.
    pub fn build(config: MaeumConfig) -> Result<Self, MaeumCoreError> {
        let transcript_path = match config.transcript.path.as_deref() {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => SqliteTranscriptStore::default_path().ok_or_else(|| {
                MaeumCoreError::Setup(
                    "no home directory for the transcript database; set transcript.path"
                        .to_string(),
                )
            })?,
        };
        let transcripts: Arc<dyn TranscriptStore> =
            Arc::new(SqliteTranscriptStore::open(&transcript_path)?);

        let generator: Arc<dyn ResponseGenerator> =
            Arc::new(LlmResponseGenerator::from_config(&config.generation)?);
        let orchestrator = Arc::new(TurnOrchestrator::from_config(&config, generator));

        let speech = SpeechClient::from_config(&config.speech)?;
        match &speech {
            Some(client) => info!("speech services enabled (endpoint={})", client.endpoint()),
            None => warn!("speech services disabled; voice and tts routes will return 503"),
        }

        let chat = ChatService::new(orchestrator, transcripts.clone(), speech.map(SpeechServices::from))
            .with_emotion_top_k(config.speech.emotion_top_k)
            .with_tts_speed(config.speech.tts_speed);
        let status = chat.memory_status();
        info!(
            "application context ready (memory_enabled={}, storage={}, model={})",
            status.enabled, status.storage, config.generation.model
        );
        Ok(Self::new(config, chat, transcripts))
    }

    pub fn config(&self) -> &MaeumConfig {
        &self.config
    }

    pub fn chat(&self) -> &ChatService {
        &self.chat
    }

    pub fn transcripts(&self) -> &Arc<dyn TranscriptStore> {
        &self.transcripts
    }
}

#[cfg(test)]
mod tests {
    use super::AppContext;
    use maeum_rs_config::MaeumConfig;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn build_wires_defaults_with_memory_and_speech_off() {
        let temp = tempdir().expect("tempdir");
        let mut config = MaeumConfig::default();
        config.transcript.path = Some(temp.path().join("conv.db").display().to_string());

        let context = AppContext::build(config).expect("context");
        assert!(!context.chat().memory_status().enabled);
        assert!(!context.chat().speech_enabled());
        let health = context.chat().health();
        assert_eq!(health.status, "unhealthy");
        assert!(health.models_loaded.llm);
        assert_eq!(health.generator.model, "finetuned-model");
        assert_eq!(health.transcript.map(|stats| stats.messages), Some(0));
    }
}
