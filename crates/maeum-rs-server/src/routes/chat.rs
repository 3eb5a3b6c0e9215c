//! `/api/chat` routes.

use crate::SharedContext;
use crate::error::ApiError;
use crate::schema::{ChatRequest, ChatResponse, TtsRequest, VoiceChatRequest, VoiceChatResponse};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::info;
use maeum_rs_core::HealthReport;
use serde_json::{Value, json};
use uuid::Uuid;

pub fn router() -> Router<SharedContext> {
    Router::new()
        .route("/text", post(chat_text))
        .route("/voice", post(chat_voice))
        .route("/tts", post(text_to_speech))
        .route("/conversation/{conversation_id}", delete(clear_conversation))
        .route("/health", get(health))
        .route("/memory/status", get(memory_status))
}

async fn chat_text(
    State(context): State<SharedContext>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = body?;
    let reply = context
        .chat()
        .chat_text(&request.message, request.conversation_id.as_deref())
        .await?;
    Ok(Json(ChatResponse {
        response: reply.response,
        emotion: None,
        emotion_probability: None,
        conversation_id: reply.conversation_id,
    }))
}

async fn chat_voice(
    State(context): State<SharedContext>,
    body: Result<Json<VoiceChatRequest>, JsonRejection>,
) -> Result<Json<VoiceChatResponse>, ApiError> {
    let Json(request) = body?;
    if !context.chat().speech_enabled() {
        return Err(ApiError::Unavailable(
            "speech services are not configured".to_string(),
        ));
    }
    let audio = BASE64
        .decode(request.audio.trim())
        .map_err(|err| ApiError::Unprocessable(format!("invalid base64 audio: {err}")))?;
    let max_bytes = context.config().server.max_audio_bytes;
    if audio.len() > max_bytes {
        return Err(ApiError::Unprocessable(format!(
            "audio exceeds {max_bytes} bytes"
        )));
    }
    info!("voice request received (audio_bytes={})", audio.len());
    let reply = context
        .chat()
        .chat_voice(&audio, request.conversation_id.as_deref())
        .await?;
    Ok(Json(VoiceChatResponse {
        transcribed_text: reply.transcribed_text,
        detected_emotion: reply.detected_emotion,
        emotion_probability: reply.emotion_probability,
        emotion_top3: reply.emotion_top_k,
        llm_response: reply.llm_response,
        conversation_id: reply.conversation_id,
    }))
}

async fn text_to_speech(
    State(context): State<SharedContext>,
    body: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let text = request
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ApiError::Unprocessable("Missing 'text' field in request body".to_string()))?;
    let audio = context.chat().synthesize(&text).await?;
    let filename = format!("tts_{}.wav", Uuid::new_v4());
    Ok((
        [
            (CONTENT_TYPE, "audio/wav".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        audio,
    ))
}

async fn clear_conversation(
    State(context): State<SharedContext>,
    Path(conversation_id): Path<String>,
) -> Json<Value> {
    let cleared = context.chat().clear(&conversation_id).await;
    Json(json!({
        "status": "success",
        "message": format!("Conversation {conversation_id} cleared"),
        "memory_cleared": cleared,
    }))
}

async fn health(State(context): State<SharedContext>) -> Json<HealthReport> {
    Json(context.chat().health())
}

async fn memory_status(State(context): State<SharedContext>) -> Json<Value> {
    Json(json!({
        "status": "success",
        "memory_bank": context.chat().memory_status(),
    }))
}
