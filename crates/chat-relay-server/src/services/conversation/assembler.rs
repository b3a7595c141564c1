use tracing::debug;

use crate::config::{ConversationConfig, PromptsConfig};
use crate::models::chat::{ChatMessage, Role, Session, Turn};

/// Builds provider payloads from session history and keeps history bounded
#[derive(Debug, Clone)]
pub struct ConversationAssembler {
    persona_prompt: String,
    acknowledgement: String,
    context_window: usize,
    history_cap: usize,
}

impl ConversationAssembler {
    pub fn new(
        persona_prompt: impl Into<String>,
        acknowledgement: impl Into<String>,
        context_window: usize,
        history_cap: usize,
    ) -> Self {
        Self {
            persona_prompt: persona_prompt.into(),
            acknowledgement: acknowledgement.into(),
            context_window,
            history_cap,
        }
    }

    pub fn from_config(prompts: &PromptsConfig, conversation: &ConversationConfig) -> Self {
        Self::new(
            prompts.persona.clone(),
            prompts.acknowledgement.clone(),
            conversation.context_window,
            conversation.history_cap,
        )
    }

    /// Persona turn, acknowledgement turn, then the most recent
    /// `context_window` turns of the session, oldest first.
    ///
    /// The new user turn must already be appended to `session`.
    pub fn build_payload(&self, session: &Session) -> Vec<ChatMessage> {
        let start = session.turns.len().saturating_sub(self.context_window);
        let recent = &session.turns[start..];

        let mut payload = Vec::with_capacity(recent.len() + 2);
        payload.push(ChatMessage::new(Role::User, self.persona_prompt.clone()));
        payload.push(ChatMessage::new(Role::Model, self.acknowledgement.clone()));
        payload.extend(recent.iter().map(ChatMessage::from));

        debug!(
            "Assembled payload for session {}: {} history turns (of {})",
            session.id,
            recent.len(),
            session.turns.len()
        );
        payload
    }

    /// Append the model reply and drop the oldest turns beyond the cap.
    /// Returns the resulting history length.
    pub fn append_reply(&self, session: &mut Session, reply: impl Into<String>) -> usize {
        session.turns.push(Turn::model(reply));

        if session.turns.len() > self.history_cap {
            let excess = session.turns.len() - self.history_cap;
            session.turns.drain(..excess);
            debug!("Trimmed {} oldest turns from session {}", excess, session.id);
        }

        session.turns.len()
    }

    pub fn context_window(&self) -> usize {
        self.context_window
    }

    pub fn history_cap(&self) -> usize {
        self.history_cap
    }
}
