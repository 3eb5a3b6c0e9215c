//! Per-conversation async locks.
//!
//! Used by the orchestrator around a whole turn and by the remote store
//! around each read-modify-write append.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Async locks keyed by conversation id. Requests for different
/// conversations never contend; idle entries are pruned on each acquire.
#[derive(Debug, Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to one conversation.
    pub async fn acquire(&self, conversation_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(conversation_id.to_string())
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of tracked conversations, held or awaited.
    pub fn tracked(&self) -> usize {
        self.locks.lock().len()
    }
}
