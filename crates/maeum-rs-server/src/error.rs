//! API error type and its HTTP mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::{error, warn};
use maeum_rs_core::{MaeumCoreError, TranscriptError};
use serde_json::json;
use thiserror::Error;

/// Errors returned by route handlers. Rendered as `{"detail": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MaeumCoreError> for ApiError {
    fn from(err: MaeumCoreError) -> Self {
        match err {
            MaeumCoreError::InvalidRequest(message) => ApiError::Unprocessable(message),
            MaeumCoreError::NotFound(message) => ApiError::NotFound(message),
            MaeumCoreError::SpeechUnavailable => {
                ApiError::Unavailable("speech services are not configured".to_string())
            }
            MaeumCoreError::Generation(message) => {
                ApiError::Internal(format!("Error generating response: {message}"))
            }
            MaeumCoreError::Speech(speech) => {
                ApiError::Internal(format!("Error processing audio: {speech}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TranscriptError> for ApiError {
    fn from(err: TranscriptError) -> Self {
        match err {
            TranscriptError::InvalidRecord(message) => ApiError::Unprocessable(message),
            other => ApiError::Internal(format!("transcript error: {other}")),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Unprocessable(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed (status={}, detail={})", status.as_u16(), self);
        } else {
            warn!("request rejected (status={}, detail={})", status.as_u16(), self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::http::StatusCode;
    use maeum_rs_core::MaeumCoreError;
    use maeum_rs_protocol::SpeechError;
    use pretty_assertions::assert_eq;

    #[test]
    fn core_errors_map_to_statuses() {
        let cases = [
            (
                MaeumCoreError::InvalidRequest("empty".to_string()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                MaeumCoreError::Generation("offline".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (MaeumCoreError::SpeechUnavailable, StatusCode::SERVICE_UNAVAILABLE),
            (
                MaeumCoreError::Speech(SpeechError::EmptyTranscript),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                MaeumCoreError::NotFound("c1".to_string()),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }
}
