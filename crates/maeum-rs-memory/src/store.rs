//! Memory store interface and the disabled variant.

use async_trait::async_trait;
use log::debug;
use maeum_rs_protocol::{MemoryStatus, Role, Turn};

/// Conversation memory consulted for prompt construction.
///
/// Every operation degrades instead of failing: errors are logged inside the
/// store and surface as `false` or an empty history.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store one turn, creating the conversation if needed. The emotion label
    /// is embedded in the stored content as the annotation prefix.
    async fn add_turn(
        &self,
        conversation_id: &str,
        text: &str,
        role: Role,
        emotion: Option<&str>,
    ) -> bool;

    /// At most `max_turns` most recent turns, oldest first. Empty for unknown
    /// conversations and on any failure.
    async fn fetch_history(&self, conversation_id: &str, max_turns: usize) -> Vec<Turn>;

    /// Delete all history for a conversation. Unknown conversations count as
    /// cleared.
    async fn clear(&self, conversation_id: &str) -> bool;

    /// Backend identity and configuration for health reporting.
    fn status(&self) -> MemoryStatus;

    fn is_enabled(&self) -> bool {
        self.status().enabled
    }
}

/// No-op store selected when the remote backend is unconfigured or failed to
/// initialize. The selection holds for the process lifetime.
#[derive(Debug, Clone)]
pub struct DisabledMemoryStore {
    status: MemoryStatus,
}

impl DisabledMemoryStore {
    /// Create a disabled store that reports the configured identity and why
    /// it was disabled.
    pub fn new(
        reason: impl Into<String>,
        project_id: Option<String>,
        location: Option<String>,
        data_store_id: Option<String>,
    ) -> Self {
        Self {
            status: MemoryStatus {
                enabled: false,
                backend_available: false,
                service: crate::REMOTE_SERVICE_NAME.to_string(),
                project_id,
                location,
                data_store_id,
                storage: "disabled (conversations are not remembered)".to_string(),
                disabled_reason: Some(reason.into()),
            },
        }
    }
}

impl Default for DisabledMemoryStore {
    fn default() -> Self {
        Self::new("memory disabled", None, None, None)
    }
}

#[async_trait]
impl MemoryStore for DisabledMemoryStore {
    async fn add_turn(
        &self,
        conversation_id: &str,
        _text: &str,
        role: Role,
        _emotion: Option<&str>,
    ) -> bool {
        debug!(
            "memory disabled; dropping turn (conversation_id={}, role={})",
            conversation_id, role
        );
        false
    }

    async fn fetch_history(&self, conversation_id: &str, _max_turns: usize) -> Vec<Turn> {
        debug!(
            "memory disabled; returning empty history (conversation_id={})",
            conversation_id
        );
        Vec::new()
    }

    async fn clear(&self, conversation_id: &str) -> bool {
        debug!(
            "memory disabled; nothing to clear (conversation_id={})",
            conversation_id
        );
        false
    }

    fn status(&self) -> MemoryStatus {
        self.status.clone()
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::{DisabledMemoryStore, MemoryStore};
    use maeum_rs_protocol::Role;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn disabled_store_is_a_silent_no_op() {
        let store = DisabledMemoryStore::new(
            "memory.project_id is not set",
            None,
            Some("us-central1".to_string()),
            None,
        );

        assert!(!store.is_enabled());
        assert!(!store.add_turn("c1", "안녕", Role::User, Some("기쁨")).await);
        assert!(!store.add_turn("c1", "반가워요", Role::Assistant, None).await);
        assert_eq!(store.fetch_history("c1", 10).await, Vec::new());
        assert!(!store.clear("c1").await);

        let status = store.status();
        assert!(!status.enabled);
        assert!(!status.backend_available);
        assert_eq!(
            status.disabled_reason.as_deref(),
            Some("memory.project_id is not set")
        );
    }
}
