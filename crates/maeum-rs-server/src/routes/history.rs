//! `/api/history` routes over the local transcript.

use crate::SharedContext;
use crate::error::ApiError;
use crate::schema::{
    AddMessageRequest, CreateConversationRequest, ListConversationsQuery, ListMessagesQuery,
};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use maeum_rs_core::{ConversationDetail, ConversationSummary, NewMessage, TranscriptMessage};
use maeum_rs_protocol::Role;
use serde_json::{Value, json};

pub fn router() -> Router<SharedContext> {
    Router::new()
        .route(
            "/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/conversations/{conversation_id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/conversations/{conversation_id}/messages", get(list_messages))
        .route("/messages", post(add_message))
}

async fn list_conversations(
    State(context): State<SharedContext>,
    query: Result<Query<ListConversationsQuery>, QueryRejection>,
) -> Result<Json<Vec<ConversationSummary>>, ApiError> {
    let Query(query) = query?;
    let conversations = context.transcripts().list_conversations(
        query.user_id.as_deref(),
        query.limit,
        query.offset,
    )?;
    Ok(Json(conversations))
}

async fn get_conversation(
    State(context): State<SharedContext>,
    Path(conversation_id): Path<String>,
) -> Result<Json<ConversationDetail>, ApiError> {
    context
        .transcripts()
        .get_conversation(&conversation_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))
}

async fn create_conversation(
    State(context): State<SharedContext>,
    body: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    if request.conversation_id.trim().is_empty() {
        return Err(ApiError::Unprocessable(
            "conversation_id must not be empty".to_string(),
        ));
    }
    let outcome = context.transcripts().create_conversation(
        &request.conversation_id,
        request.user_id.as_deref(),
        request.title.as_deref(),
    )?;
    Ok(Json(json!({
        "status": outcome.as_str(),
        "conversation_id": request.conversation_id,
    })))
}

async fn add_message(
    State(context): State<SharedContext>,
    body: Result<Json<AddMessageRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let role = Role::parse(&request.role)
        .ok_or_else(|| ApiError::Unprocessable(format!("unknown role: {}", request.role)))?;
    let message = NewMessage::new(request.conversation_id, role, request.content)
        .with_emotion(request.emotion, request.emotion_probability);
    let message_id = context.transcripts().add_message(&message)?;
    Ok(Json(json!({
        "status": "success",
        "message_id": message_id,
        "conversation_id": message.conversation_id,
    })))
}

async fn delete_conversation(
    State(context): State<SharedContext>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if !context.transcripts().delete_conversation(&conversation_id)? {
        return Err(ApiError::NotFound("Conversation not found".to_string()));
    }
    Ok(Json(json!({
        "status": "success",
        "message": format!("Conversation {conversation_id} deleted"),
    })))
}

async fn list_messages(
    State(context): State<SharedContext>,
    Path(conversation_id): Path<String>,
    query: Result<Query<ListMessagesQuery>, QueryRejection>,
) -> Result<Json<Vec<TranscriptMessage>>, ApiError> {
    let Query(query) = query?;
    Ok(Json(context.transcripts().list_messages(
        &conversation_id,
        query.limit,
        query.offset,
    )?))
}
