use crate::models::chat::{HistoryEntry, HistoryResponse, NewSessionResponse};
use crate::services::ChatService;
use crate::utils::error::ApiError;
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::debug;

pub async fn new_session_handler(
    State(chat_service): State<Arc<ChatService>>,
) -> Result<Json<NewSessionResponse>, ApiError> {
    let session = chat_service.create_session();

    // Welcome text is the last seeded turn
    let welcome_message = session
        .turns
        .last()
        .map(|turn| turn.text.clone())
        .unwrap_or_default();

    Ok(Json(NewSessionResponse {
        user_id: session.id,
        welcome_message,
    }))
}

pub async fn chat_history_handler(
    State(chat_service): State<Arc<ChatService>>,
    Path(user_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = chat_service.history(&user_id)?;
    debug!("History request: session={}, turns={}", user_id, session.len());

    let history = session
        .turns
        .iter()
        .map(|turn| HistoryEntry {
            role: turn.role,
            text: turn.text.clone(),
            timestamp: turn.timestamp.unwrap_or(session.created_at),
        })
        .collect();

    Ok(Json(HistoryResponse { history }))
}
