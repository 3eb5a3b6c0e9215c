//! Conversation memory for Maeum.
//!
//! The orchestrator talks to a [`MemoryStore`]. Two variants exist: a
//! [`RemoteMemoryStore`] backed by a managed conversational-search service,
//! and a [`DisabledMemoryStore`] that accepts every call and keeps nothing.

pub mod error;
pub mod locks;
pub mod model;
pub mod remote;
pub mod store;

/// Memory error type.
pub use error::MemoryError;
/// Async locks keyed by conversation id.
pub use locks::ConversationLocks;
/// Wire records exchanged with the remote service.
pub use model::{RemoteConversation, RemoteMessage};
/// Remote store and its connection settings.
pub use remote::{RemoteMemorySettings, RemoteMemoryStore};
/// Memory store interface and the disabled variant.
pub use store::{DisabledMemoryStore, MemoryStore};

/// Service name reported in memory status.
pub const REMOTE_SERVICE_NAME: &str = "Vertex AI Conversational Search";
