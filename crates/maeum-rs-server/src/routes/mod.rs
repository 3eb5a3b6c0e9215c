pub mod chat;
pub mod history;

use crate::SharedContext;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};

pub fn root() -> Router<SharedContext> {
    Router::new().route("/", get(welcome))
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Maeum empathetic chatbot API",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/api/chat/health",
    }))
}
