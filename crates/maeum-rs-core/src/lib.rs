//! Core conversation primitives for Maeum.
//!
//! This crate owns the turn orchestrator, prompt assembly, response
//! generation and cleanup, the local transcript mirror, the speech client,
//! and the application context shared by every request handler.

pub mod chat;
pub mod context;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod speech;
pub mod transcript;

pub use chat::{
    ChatService, HealthReport, ModelsLoaded, SpeechServices, TextChatReply, VoiceChatReply,
};
pub use context::AppContext;
pub use error::MaeumCoreError;
pub use generator::{
    FALLBACK_REPLY, GREETING_REPLY, GeneratorInfo, LlmResponseGenerator, ResponseCleaner,
    ResponseGenerator, SamplingParams,
};
pub use orchestrator::{
    ConversationLocks, DEFAULT_HISTORY_TURNS, TurnOrchestrator, memory::memory_store_from_config,
    prompt::{DEFAULT_PERSONA, PromptBuilder},
};
pub use speech::SpeechClient;
pub use transcript::{
    ConversationDetail, ConversationSummary, CreateOutcome, DEFAULT_TITLE, NewMessage,
    SqliteTranscriptStore, TranscriptError, TranscriptMessage, TranscriptStats, TranscriptStore,
};
