pub mod chat_service;
pub mod conversation;
pub mod gemini;
pub mod session;

pub use chat_service::{ChatReply, ChatService, GenerationProvider};
pub use conversation::ConversationAssembler;
pub use gemini::GeminiClient;
pub use session::{SessionStore, WelcomeExchange};
