//! Request and response bodies.

use maeum_rs_protocol::EmotionPrediction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub emotion: Option<String>,
    pub emotion_probability: Option<f32>,
    pub conversation_id: String,
}

/// Voice upload: base64-encoded audio in a JSON body.
#[derive(Debug, Deserialize)]
pub struct VoiceChatRequest {
    pub audio: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoiceChatResponse {
    pub transcribed_text: String,
    pub detected_emotion: String,
    pub emotion_probability: f32,
    pub emotion_top3: Vec<EmotionPrediction>,
    pub llm_response: String,
    pub conversation_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_conversation_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    #[serde(default = "default_message_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_conversation_limit() -> usize {
    50
}

fn default_message_limit() -> usize {
    100
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub conversation_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMessageRequest {
    pub conversation_id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub emotion: Option<String>,
    #[serde(default)]
    pub emotion_probability: Option<f32>,
}
