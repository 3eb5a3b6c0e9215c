use async_trait::async_trait;
use maeum_rs_memory::MemoryStore;
use maeum_rs_protocol::{MemoryStatus, Role, Turn, annotate_emotion};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One `add_turn` call as observed by [`StubMemory`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddedTurn {
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    pub emotion: Option<String>,
    pub stored: bool,
}

/// In-process memory store. Stores user content with the emotion annotation,
/// like the remote store, and can be told to fail commits per role.
#[derive(Clone)]
pub struct StubMemory {
    enabled: bool,
    conversations: Arc<Mutex<HashMap<String, Vec<Turn>>>>,
    added: Arc<Mutex<Vec<AddedTurn>>>,
    failing_roles: Arc<Mutex<HashSet<Role>>>,
    fetches: Arc<AtomicUsize>,
}

impl Default for StubMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl StubMemory {
    pub fn new() -> Self {
        Self {
            enabled: true,
            conversations: Arc::new(Mutex::new(HashMap::new())),
            added: Arc::new(Mutex::new(Vec::new())),
            failing_roles: Arc::new(Mutex::new(HashSet::new())),
            fetches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Reports itself disabled while still recording calls.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    pub fn with_history(self, conversation_id: &str, turns: Vec<Turn>) -> Self {
        self.conversations
            .lock()
            .insert(conversation_id.to_string(), turns);
        self
    }

    /// Make every later commit for `role` fail.
    pub fn fail_role(&self, role: Role) {
        self.failing_roles.lock().insert(role);
    }

    pub fn added(&self) -> Vec<AddedTurn> {
        self.added.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn stored(&self, conversation_id: &str) -> Vec<Turn> {
        self.conversations
            .lock()
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl MemoryStore for StubMemory {
    async fn add_turn(
        &self,
        conversation_id: &str,
        text: &str,
        role: Role,
        emotion: Option<&str>,
    ) -> bool {
        let stored = !self.failing_roles.lock().contains(&role);
        self.added.lock().push(AddedTurn {
            conversation_id: conversation_id.to_string(),
            role,
            content: text.to_string(),
            emotion: emotion.map(str::to_string),
            stored,
        });
        if !stored {
            return false;
        }
        let content = match role {
            Role::User => annotate_emotion(text, emotion),
            _ => text.to_string(),
        };
        self.conversations
            .lock()
            .entry(conversation_id.to_string())
            .or_default()
            .push(Turn::new(role, content).with_emotion(emotion.map(str::to_string)));
        true
    }

    async fn fetch_history(&self, conversation_id: &str, max_turns: usize) -> Vec<Turn> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let turns = self.stored(conversation_id);
        let skip = turns.len().saturating_sub(max_turns);
        turns.into_iter().skip(skip).collect()
    }

    async fn clear(&self, conversation_id: &str) -> bool {
        self.conversations.lock().remove(conversation_id);
        true
    }

    fn status(&self) -> MemoryStatus {
        MemoryStatus {
            enabled: self.enabled,
            backend_available: self.enabled,
            service: "stub memory".to_string(),
            project_id: None,
            location: None,
            data_store_id: None,
            storage: "in-process stub".to_string(),
            disabled_reason: (!self.enabled).then(|| "stub disabled".to_string()),
        }
    }
}
