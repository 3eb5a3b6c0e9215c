//! Error types for memory operations.

/// Errors raised inside memory stores. They never cross the
/// [`MemoryStore`](crate::MemoryStore) boundary.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Transport or timeout failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// The conversation resource does not exist.
    #[error("conversation not found: {0}")]
    NotFound(String),
    /// The service answered with a non-success status.
    #[error("remote error (status={status}): {body}")]
    Remote { status: u16, body: String },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Missing or unusable connection settings.
    #[error("invalid memory settings: {0}")]
    InvalidSettings(String),
}
