pub mod settings;

pub use settings::{
    ConversationConfig, GeminiConfig, LogFormat, LoggingConfig, PromptsConfig, ServerConfig,
    Settings,
};
