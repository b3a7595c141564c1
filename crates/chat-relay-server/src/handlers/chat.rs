use crate::config::Settings;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::services::ChatService;
use crate::utils::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::warn;

pub async fn chat_handler(
    State(chat_service): State<Arc<ChatService>>,
    State(settings): State<Arc<Settings>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!("Unreadable chat body: {}", rejection);
            ChatRequest::default()
        }
    };

    let user_id = request
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("User ID is required".to_string()))?;

    let message = request
        .message
        .unwrap_or_else(|| settings.prompts.default_message.clone());

    let reply = chat_service.submit(&user_id, &message).await?;

    Ok(Json(ChatResponse {
        response: reply.reply,
        user_id: reply.session_id,
        history_length: reply.history_length,
    }))
}
