//! Shared domain and wire types for Maeum conversations, emotion analysis,
//! memory status reporting, and the speech collaborator interfaces.

mod speech;

pub use speech::{EmotionClassifier, SpeechError, SpeechSynthesizer, SpeechToText};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a conversation. Clients may supply arbitrary ids.
pub type ConversationId = String;

/// Speaker of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona and policy instructions.
    System,
    /// End-user message.
    User,
    /// Generated reply.
    Assistant,
}

impl Role {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a wire name; only the exact lowercase names are accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message exchanged in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Speaker of the turn.
    pub role: Role,
    /// Message text.
    pub content: String,
    /// Emotion label, only present on user turns derived from voice input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    /// Ordering key assigned at creation.
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Build a turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            emotion: None,
            timestamp: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Attach an emotion label to the turn.
    pub fn with_emotion(mut self, emotion: Option<String>) -> Self {
        self.emotion = emotion;
        self
    }

    /// Override the ordering timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Opening of the emotion annotation prefix.
const EMOTION_MARKER_OPEN: &str = "[감지된 감정: ";

/// Prefix `message` with the emotion annotation when a non-blank label is
/// present: `"[감지된 감정: {emotion}] {message}"`. Without a label the message
/// is returned unchanged.
pub fn annotate_emotion(message: &str, emotion: Option<&str>) -> String {
    match emotion.map(str::trim).filter(|label| !label.is_empty()) {
        Some(label) => format!("{EMOTION_MARKER_OPEN}{label}] {message}"),
        None => message.to_string(),
    }
}

/// Extract the emotion label from annotated content, if present.
pub fn parse_emotion_annotation(content: &str) -> Option<&str> {
    let rest = content.strip_prefix(EMOTION_MARKER_OPEN)?;
    let (label, _) = rest.split_once("] ")?;
    (!label.is_empty()).then_some(label)
}

/// A single emotion label with its probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionPrediction {
    pub label: String,
    pub probability: f32,
}

/// Result of classifying one audio clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionAnalysis {
    /// Most likely label.
    pub top_label: String,
    /// Probability of the most likely label.
    pub top_probability: f32,
    /// Top-k predictions, most likely first.
    pub top_k: Vec<EmotionPrediction>,
}

/// Observability record for the memory backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStatus {
    /// Whether the enabled variant was selected at startup.
    pub enabled: bool,
    /// Whether a backend client handle exists.
    pub backend_available: bool,
    /// Backend service name.
    pub service: String,
    pub project_id: Option<String>,
    pub location: Option<String>,
    pub data_store_id: Option<String>,
    /// Where conversation history lives.
    pub storage: String,
    /// Why the disabled variant was selected, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<String>,
}
