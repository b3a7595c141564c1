use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_PERSONA_PROMPT: &str = r#"You are the AI assistant for IntelliBazar, an innovative AI-powered e-commerce web application created by PAPAN.

About IntelliBazar:
- Built using the MERN stack (MongoDB, Express.js, React, Node.js)
- Offers seamless shopping experience with Google OAuth and email/password authentication
- Features modern UI with featured collections, product banners, and dynamic shopping cart using React Context
- Users can browse, search, and purchase products
- Backend efficiently handles user authentication, product data, and order management
- Integrates AI components like personalized recommendations and smart search
- Created by PAPAN

Your role:
- Help users navigate and use IntelliBazar
- Answer questions about products, features, and shopping
- Provide assistance with account management, orders, and technical issues
- Offer personalized shopping recommendations
- Be friendly, helpful, and knowledgeable about e-commerce
- Always mention that IntelliBazar was created by PAPAN when relevant
- Keep responses concise but informative

Remember: You represent IntelliBazar's commitment to providing an exceptional AI-powered shopping experience."#;

const DEFAULT_ACKNOWLEDGEMENT: &str = "I understand. I am the AI assistant for IntelliBazar, ready to help users with their shopping experience.";

const DEFAULT_WELCOME_GREETING: &str = "Hello! I'm new to IntelliBazar.";

const DEFAULT_WELCOME_MESSAGE: &str = r#"Welcome to IntelliBazar! 🛍️ I'm your AI shopping assistant, here to help you navigate our amazing e-commerce platform created by PAPAN.

IntelliBazar offers:
✨ AI-powered product recommendations
🔍 Smart search functionality
🛒 Seamless shopping cart experience
🔐 Secure authentication (Google OAuth & email/password)
📱 Modern, user-friendly interface

How can I help you today? Whether you're looking for products, need help with your account, or want to learn more about our features, I'm here to assist!"#;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the bundled front-end, served for unmatched paths
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// No timeout is applied when unset
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationConfig {
    /// Number of most recent turns forwarded to the provider
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    /// Number of turns retained per session
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

fn default_context_window() -> usize {
    10
}

fn default_history_cap() -> usize {
    50
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            history_cap: default_history_cap(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptsConfig {
    #[serde(default = "default_persona")]
    pub persona: String,
    #[serde(default = "default_acknowledgement")]
    pub acknowledgement: String,
    #[serde(default = "default_welcome_greeting")]
    pub welcome_greeting: String,
    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,
    /// Sent in place of an omitted chat message
    #[serde(default = "default_message")]
    pub default_message: String,
}

fn default_persona() -> String {
    DEFAULT_PERSONA_PROMPT.to_string()
}

fn default_acknowledgement() -> String {
    DEFAULT_ACKNOWLEDGEMENT.to_string()
}

fn default_welcome_greeting() -> String {
    DEFAULT_WELCOME_GREETING.to_string()
}

fn default_welcome_message() -> String {
    DEFAULT_WELCOME_MESSAGE.to_string()
}

fn default_message() -> String {
    "Hello".to_string()
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
            acknowledgement: default_acknowledgement(),
            welcome_greeting: default_welcome_greeting(),
            welcome_message: default_welcome_message(),
            default_message: default_message(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Filter directives, overridden by `RUST_LOG` when set
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Rolling log file directory; file logging is off when unset
    #[serde(default = "default_log_directory")]
    pub directory: Option<PathBuf>,
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

fn default_log_level() -> String {
    "info,chat_relay_server=debug,tower_http=info".to_string()
}

fn default_log_directory() -> Option<PathBuf> {
    Some(PathBuf::from("logs"))
}

fn default_log_file_prefix() -> String {
    "relay".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;

        if settings.gemini.api_key.is_empty() {
            settings.gemini.api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gemini.api_key.trim().is_empty() {
            bail!("Gemini API key missing: set GEMINI_API_KEY or APP__GEMINI__API_KEY");
        }
        if self.conversation.history_cap == 0 {
            bail!("conversation.history_cap must be greater than zero");
        }
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        PathBuf::from("config/settings.toml")
    }
}
