use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};

use crate::models::chat::{ChatMessage, Session, SessionId, Turn};
use crate::services::conversation::ConversationAssembler;
use crate::services::session::SessionStore;
use crate::utils::error::ApiError;

/// Trait for the text generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Outcome of a successful chat submission
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub session_id: SessionId,
    pub reply: String,
    pub history_length: usize,
}

/// Drives Session Store -> Conversation Assembler -> Generation Provider
#[derive(Clone)]
pub struct ChatService {
    store: SessionStore,
    assembler: ConversationAssembler,
    provider: Arc<dyn GenerationProvider>,
}

impl ChatService {
    pub fn new(
        store: SessionStore,
        assembler: ConversationAssembler,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            store,
            assembler,
            provider,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create a session under a fresh UUID and return it
    pub fn create_session(&self) -> Session {
        let session_id = uuid::Uuid::new_v4().to_string();
        let session = self.store.get_or_create(&session_id);
        info!(
            "Created session {} ({} active)",
            session_id,
            self.store.len()
        );
        session
    }

    pub fn history(&self, session_id: &str) -> Result<Session, ApiError> {
        self.store
            .get(session_id)
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))
    }

    /// Append `message` as a user turn, forward the windowed conversation,
    /// and record the reply. Unknown sessions are created on the fly.
    ///
    /// On provider failure the user turn stays and no model turn is added.
    pub async fn submit(&self, session_id: &str, message: &str) -> Result<ChatReply, ApiError> {
        self.store.get_or_create(session_id);

        // Serializes submissions to this session until the reply is stored
        let _writer = self
            .store
            .writer(session_id)
            .await
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        let payload = self
            .store
            .update(session_id, |session| {
                session.turns.push(Turn::user(message));
                self.assembler.build_payload(session)
            })
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        info!(
            "Chat request: session={}, message_len={}, payload_turns={}",
            session_id,
            message.len(),
            payload.len()
        );

        let reply = match self.provider.generate(&payload).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Generation failed for session {}: {:#}", session_id, e);
                error!("Full error: {:?}", e);
                return Err(ApiError::LlmError(e.to_string()));
            }
        };

        let history_length = self
            .store
            .update(session_id, |session| {
                self.assembler.append_reply(session, reply.clone())
            })
            .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

        Ok(ChatReply {
            session_id: session_id.to_string(),
            reply,
            history_length,
        })
    }
}
