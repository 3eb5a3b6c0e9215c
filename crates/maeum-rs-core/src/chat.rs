//! Chat flows exposed to the API surface.

use crate::error::MaeumCoreError;
use crate::generator::GeneratorInfo;
use crate::orchestrator::TurnOrchestrator;
use crate::speech::SpeechClient;
use crate::transcript::{NewMessage, TranscriptStats, TranscriptStore};
use log::{error, info, warn};
use maeum_rs_protocol::{
    ConversationId, EmotionClassifier, EmotionPrediction, MemoryStatus, Role, SpeechSynthesizer,
    SpeechToText,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Speech collaborators used by the voice and TTS flows.
#[derive(Clone)]
pub struct SpeechServices {
    pub stt: Arc<dyn SpeechToText>,
    pub emotion: Arc<dyn EmotionClassifier>,
    pub tts: Arc<dyn SpeechSynthesizer>,
}

impl SpeechServices {
    /// One backend serving all three collaborators.
    pub fn shared<T>(backend: Arc<T>) -> Self
    where
        T: SpeechToText + EmotionClassifier + SpeechSynthesizer + 'static,
    {
        Self {
            stt: backend.clone(),
            emotion: backend.clone(),
            tts: backend,
        }
    }
}

impl From<SpeechClient> for SpeechServices {
    fn from(client: SpeechClient) -> Self {
        Self::shared(Arc::new(client))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextChatReply {
    pub response: String,
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoiceChatReply {
    pub transcribed_text: String,
    pub detected_emotion: String,
    pub emotion_probability: f32,
    pub emotion_top_k: Vec<EmotionPrediction>,
    pub llm_response: String,
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelsLoaded {
    pub stt: bool,
    pub emotion: bool,
    pub llm: bool,
    pub tts: bool,
}

impl ModelsLoaded {
    pub fn all(&self) -> bool {
        self.stt && self.emotion && self.llm && self.tts
    }
}

/// Health of both persistence sinks and every model collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: String,
    pub message: String,
    pub models_loaded: ModelsLoaded,
    pub memory_bank_status: MemoryStatus,
    /// `None` when the transcript could not be queried.
    pub transcript: Option<TranscriptStats>,
    pub generator: GeneratorInfo,
}

/// Chat operations: orchestration plus the local transcript mirror.
#[derive(Clone)]
pub struct ChatService {
    orchestrator: Arc<TurnOrchestrator>,
    transcripts: Arc<dyn TranscriptStore>,
    speech: Option<SpeechServices>,
    emotion_top_k: usize,
    tts_speed: f32,
}

impl ChatService {
    pub fn new(
        orchestrator: Arc<TurnOrchestrator>,
        transcripts: Arc<dyn TranscriptStore>,
        speech: Option<SpeechServices>,
    ) -> Self {
        Self {
            orchestrator,
            transcripts,
            speech,
            emotion_top_k: 3,
            tts_speed: 1.0,
        }
    }

    pub fn with_emotion_top_k(mut self, top_k: usize) -> Self {
        self.emotion_top_k = top_k.max(1);
        self
    }

    pub fn with_tts_speed(mut self, speed: f32) -> Self {
        self.tts_speed = speed;
        self
    }

    pub fn orchestrator(&self) -> &Arc<TurnOrchestrator> {
        &self.orchestrator
    }

    pub fn speech_enabled(&self) -> bool {
        self.speech.is_some()
    }

    pub async fn chat_text(
        &self,
        message: &str,
        conversation_id: Option<&str>,
    ) -> Result<TextChatReply, MaeumCoreError> {
        let conversation_id = resolve_conversation_id(conversation_id);
        let response = self
            .orchestrator
            .respond(message, &conversation_id, None)
            .await?;
        self.mirror(&NewMessage::new(conversation_id.clone(), Role::User, message), &response);
        Ok(TextChatReply {
            response,
            conversation_id,
        })
    }

    /// Transcribe, classify, respond with the detected emotion, then mirror.
    pub async fn chat_voice(
        &self,
        audio: &[u8],
        conversation_id: Option<&str>,
    ) -> Result<VoiceChatReply, MaeumCoreError> {
        let speech = self.speech.as_ref().ok_or(MaeumCoreError::SpeechUnavailable)?;
        if audio.is_empty() {
            return Err(MaeumCoreError::InvalidRequest(
                "audio must not be empty".to_string(),
            ));
        }
        let conversation_id = resolve_conversation_id(conversation_id);

        let transcribed_text = speech.stt.transcribe(audio).await?;
        let analysis = speech.emotion.predict(audio, self.emotion_top_k).await?;
        info!(
            "voice analyzed (conversation_id={}, emotion={}, probability={:.3})",
            conversation_id, analysis.top_label, analysis.top_probability
        );

        let llm_response = self
            .orchestrator
            .respond(&transcribed_text, &conversation_id, Some(&analysis.top_label))
            .await?;
        self.mirror(
            &NewMessage::new(conversation_id.clone(), Role::User, transcribed_text.clone())
                .with_emotion(
                    Some(analysis.top_label.clone()),
                    Some(analysis.top_probability),
                ),
            &llm_response,
        );
        Ok(VoiceChatReply {
            transcribed_text,
            detected_emotion: analysis.top_label,
            emotion_probability: analysis.top_probability,
            emotion_top_k: analysis.top_k,
            llm_response,
            conversation_id,
        })
    }

    /// WAV audio for `text` at the configured speed.
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, MaeumCoreError> {
        let speech = self.speech.as_ref().ok_or(MaeumCoreError::SpeechUnavailable)?;
        if text.trim().is_empty() {
            return Err(MaeumCoreError::InvalidRequest(
                "text must not be empty".to_string(),
            ));
        }
        Ok(speech.tts.synthesize(text, self.tts_speed).await?)
    }

    /// Clear remote memory only; the transcript keeps its copy.
    pub async fn clear(&self, conversation_id: &str) -> bool {
        self.orchestrator.clear(conversation_id).await
    }

    pub fn memory_status(&self) -> MemoryStatus {
        self.orchestrator.memory_status()
    }

    pub fn health(&self) -> HealthReport {
        let speech = self.speech_enabled();
        let models_loaded = ModelsLoaded {
            stt: speech,
            emotion: speech,
            llm: true,
            tts: speech,
        };
        let transcript = match self.transcripts.stats() {
            Ok(stats) => Some(stats),
            Err(err) => {
                warn!("transcript stats unavailable (err={})", err);
                None
            }
        };
        let (status, message) = if models_loaded.all() {
            ("healthy", "All services running")
        } else {
            ("unhealthy", "Some services not initialized")
        };
        HealthReport {
            status: status.to_string(),
            message: message.to_string(),
            models_loaded,
            memory_bank_status: self.orchestrator.memory_status(),
            transcript,
            generator: self.orchestrator.generator_info(),
        }
    }

    fn mirror(&self, user: &NewMessage, reply: &str) {
        if let Err(err) = self.transcripts.record_exchange(user, reply) {
            error!(
                "transcript write failed (conversation_id={}, err={})",
                user.conversation_id, err
            );
        }
    }
}

fn resolve_conversation_id(conversation_id: Option<&str>) -> ConversationId {
    conversation_id
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
