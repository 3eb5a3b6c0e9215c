//! Turn orchestration: memory fetch, prompt assembly, generation, commit.

pub mod memory;
pub mod prompt;

pub use maeum_rs_memory::ConversationLocks;

use crate::error::MaeumCoreError;
use crate::generator::{GeneratorInfo, ResponseGenerator};
use log::{debug, info, warn};
use maeum_rs_config::MaeumConfig;
use maeum_rs_memory::MemoryStore;
use maeum_rs_protocol::{MemoryStatus, Role, Turn};
use prompt::PromptBuilder;
use std::sync::Arc;

/// Default number of history turns placed in each prompt.
pub const DEFAULT_HISTORY_TURNS: usize = 10;
const LOG_PREVIEW_CHARS: usize = 40;

/// Coordinates one conversation turn across memory and the generator.
///
/// Built once at startup and shared by every request; holds no per-request
/// mutable state apart from the optional per-conversation locks.
pub struct TurnOrchestrator {
    memory: Arc<dyn MemoryStore>,
    generator: Arc<dyn ResponseGenerator>,
    prompt: PromptBuilder,
    history_turns: usize,
    locks: Option<ConversationLocks>,
}

impl TurnOrchestrator {
    pub fn new(
        memory: Arc<dyn MemoryStore>,
        generator: Arc<dyn ResponseGenerator>,
        prompt: PromptBuilder,
    ) -> Self {
        Self {
            memory,
            generator,
            prompt,
            history_turns: DEFAULT_HISTORY_TURNS,
            locks: None,
        }
    }

    /// Wire the orchestrator from config with an already-built generator.
    pub fn from_config(config: &MaeumConfig, generator: Arc<dyn ResponseGenerator>) -> Self {
        let orchestrator = Self::new(
            memory::memory_store_from_config(&config.memory),
            generator,
            PromptBuilder::from_config(&config.persona),
        )
        .with_history_turns(config.memory.history_turns);
        if config.memory.serialize_conversations {
            orchestrator.with_conversation_locks()
        } else {
            orchestrator
        }
    }

    pub fn with_history_turns(mut self, history_turns: usize) -> Self {
        self.history_turns = history_turns.max(1);
        self
    }

    /// Serialize fetch, generate and commit per conversation id.
    pub fn with_conversation_locks(mut self) -> Self {
        self.locks = Some(ConversationLocks::new());
        self
    }

    /// Produce one reply for `message` in `conversation_id`.
    ///
    /// History retrieval and memory commits degrade silently; only a
    /// generation failure is returned to the caller.
    pub async fn respond(
        &self,
        message: &str,
        conversation_id: &str,
        emotion: Option<&str>,
    ) -> Result<String, MaeumCoreError> {
        if message.trim().is_empty() {
            return Err(MaeumCoreError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }
        let emotion = emotion.map(str::trim).filter(|label| !label.is_empty());
        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire(conversation_id).await),
            None => None,
        };
        debug!(
            "turn started (conversation_id={}, message_chars={}, preview={:?}, emotion={:?})",
            conversation_id,
            message.chars().count(),
            preview(message),
            emotion
        );

        let memory_enabled = self.memory.is_enabled();
        let history = if memory_enabled {
            let history = self
                .memory
                .fetch_history(conversation_id, self.history_turns)
                .await;
            info!(
                "history loaded (conversation_id={}, turns={})",
                conversation_id,
                history.len()
            );
            history
        } else {
            Vec::new()
        };

        let turns = self.prompt.build(&history, message, emotion);
        let reply = self.generator.generate(&turns).await?;

        if memory_enabled {
            if !self
                .memory
                .add_turn(conversation_id, message, Role::User, emotion)
                .await
            {
                warn!(
                    "user turn not saved to memory (conversation_id={})",
                    conversation_id
                );
            }
            if !self
                .memory
                .add_turn(conversation_id, &reply, Role::Assistant, None)
                .await
            {
                warn!(
                    "assistant turn not saved to memory (conversation_id={})",
                    conversation_id
                );
            }
        } else {
            warn!(
                "memory disabled; conversation will not persist (conversation_id={})",
                conversation_id
            );
        }
        debug!(
            "turn finished (conversation_id={}, reply_chars={})",
            conversation_id,
            reply.chars().count()
        );
        Ok(reply)
    }

    /// Drop remote history for a conversation.
    pub async fn clear(&self, conversation_id: &str) -> bool {
        let cleared = self.memory.clear(conversation_id).await;
        info!(
            "memory clear requested (conversation_id={}, cleared={})",
            conversation_id, cleared
        );
        cleared
    }

    /// Remote history as the next prompt would see it. Empty when disabled.
    pub async fn history(&self, conversation_id: &str) -> Vec<Turn> {
        if !self.memory.is_enabled() {
            return Vec::new();
        }
        self.memory
            .fetch_history(conversation_id, self.history_turns)
            .await
    }

    pub fn memory_status(&self) -> MemoryStatus {
        self.memory.status()
    }

    pub fn generator_info(&self) -> GeneratorInfo {
        self.generator.describe()
    }

    pub fn history_turns(&self) -> usize {
        self.history_turns
    }
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    if text.chars().count() > LOG_PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

#[cfg(test)]
mod tests {
    use super::preview;
    use pretty_assertions::assert_eq;

    #[test]
    fn preview_is_char_bounded() {
        let long = "가".repeat(50);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), 43);
        assert!(shown.ends_with("..."));
        assert_eq!(preview("짧은 말"), "짧은 말");
    }
}
