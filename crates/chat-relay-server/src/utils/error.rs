use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message returned to clients for any provider failure
pub const LLM_FAILURE_MESSAGE: &str = "Failed to get response from IntelliBazar AI assistant.";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("LLM error: {0}")]
    LlmError(String),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg)
            }
            ApiError::LlmError(detail) => {
                // Detail stays server-side
                tracing::error!("LLM error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    LLM_FAILURE_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> ErrorResponse {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::LlmError("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_llm_error_hides_detail() {
        let response = ApiError::LlmError("quota exceeded for key sk-123".into()).into_response();
        let body = body_of(response).await;
        assert_eq!(
            body.error,
            "Failed to get response from IntelliBazar AI assistant."
        );
        assert!(!body.error.contains("sk-123"));
    }

    #[tokio::test]
    async fn test_client_errors_carry_message() {
        let body = body_of(ApiError::NotFound("Session not found".into()).into_response()).await;
        assert_eq!(body.error, "Session not found");
    }
}
