//! Response generation against the fine-tuned chat model.

mod cleanup;

pub use cleanup::{FALLBACK_REPLY, ResponseCleaner};

use crate::error::MaeumCoreError;
use async_trait::async_trait;
use autoagents_llm::LLMProvider;
use autoagents_llm::backends::openai::OpenAI;
use autoagents_llm::builder::LLMBuilder;
use autoagents_llm::chat::{ChatMessage, ChatProvider, ChatRole, MessageType};
use log::{debug, warn};
use maeum_rs_config::GenerationConfig;
use maeum_rs_protocol::{Role, Turn};
use serde::Serialize;
use std::sync::Arc;

/// Reply used when the prompt holds no turns at all.
pub const GREETING_REPLY: &str = "안녕하세요! 편하게 이야기 나눠요.";

/// Fixed sampling configuration. Never supplied per request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplingParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,
    pub no_repeat_ngram_size: u32,
}

impl From<&GenerationConfig> for SamplingParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_new_tokens: config.max_new_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            repetition_penalty: config.repetition_penalty,
            no_repeat_ngram_size: config.no_repeat_ngram_size,
        }
    }
}

/// Model identity reported by health checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratorInfo {
    pub model: String,
    pub sampling: SamplingParams,
}

/// Produces one reply for an ordered prompt.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    /// Generate and clean a reply. Errors are fatal for the request.
    async fn generate(&self, turns: &[Turn]) -> Result<String, MaeumCoreError>;

    fn describe(&self) -> GeneratorInfo;
}

/// Generator backed by a shared chat model provider.
#[derive(Clone)]
pub struct LlmResponseGenerator {
    llm: Arc<dyn LLMProvider>,
    info: GeneratorInfo,
    cleaner: ResponseCleaner,
}

impl LlmResponseGenerator {
    pub fn new(llm: Arc<dyn LLMProvider>, info: GeneratorInfo) -> Result<Self, MaeumCoreError> {
        Ok(Self {
            llm,
            info,
            cleaner: ResponseCleaner::new()?,
        })
    }

    /// Build the OpenAI-compatible provider serving the fine-tuned model.
    ///
    /// Repetition penalty and n-gram blocking are applied by the serving side
    /// and only reported here.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, MaeumCoreError> {
        let sampling = SamplingParams::from(config);
        let llm: Arc<dyn LLMProvider> = LLMBuilder::<OpenAI>::new()
            .base_url(config.base_url.clone())
            .api_key(config.api_key.clone())
            .model(config.model.clone())
            .max_tokens(sampling.max_new_tokens)
            .temperature(sampling.temperature)
            .top_p(sampling.top_p)
            .top_k(sampling.top_k)
            .timeout_seconds(config.timeout_secs)
            .build()
            .map_err(|err| MaeumCoreError::Setup(format!("chat model provider: {err}")))?;
        Self::new(
            llm,
            GeneratorInfo {
                model: config.model.clone(),
                sampling,
            },
        )
    }
}

fn chat_message(turn: &Turn) -> ChatMessage {
    let role = match turn.role {
        Role::System => ChatRole::System,
        Role::User => ChatRole::User,
        Role::Assistant => ChatRole::Assistant,
    };
    ChatMessage {
        role,
        message_type: MessageType::Text,
        content: turn.content.clone(),
    }
}

#[async_trait]
impl ResponseGenerator for LlmResponseGenerator {
    async fn generate(&self, turns: &[Turn]) -> Result<String, MaeumCoreError> {
        if turns.is_empty() {
            return Ok(GREETING_REPLY.to_string());
        }
        let messages: Vec<ChatMessage> = turns.iter().map(chat_message).collect();
        debug!(
            "requesting reply (model={}, messages={})",
            self.info.model,
            messages.len()
        );
        let response = self
            .llm
            .chat_with_tools(&messages, None, None)
            .await
            .map_err(|err| {
                warn!("chat model call failed (model={}, err={})", self.info.model, err);
                MaeumCoreError::Generation(err.to_string())
            })?;
        let raw = response
            .text()
            .ok_or_else(|| MaeumCoreError::Generation("model returned no text".to_string()))?;
        let cleaned = self.cleaner.clean(&raw);
        debug!(
            "reply cleaned (raw_chars={}, cleaned_chars={})",
            raw.chars().count(),
            cleaned.chars().count()
        );
        Ok(cleaned)
    }

    fn describe(&self) -> GeneratorInfo {
        self.info.clone()
    }
}
