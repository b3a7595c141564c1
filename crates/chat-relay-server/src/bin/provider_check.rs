//! Sends one message straight to the configured Gemini model and prints
//! the reply. No persona or session history is involved.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use chat_relay_server::config::Settings;
use chat_relay_server::models::chat::{ChatMessage, Role};
use chat_relay_server::services::GeminiClient;

#[derive(Parser, Debug)]
#[command(name = "provider-check", version)]
struct Args {
    /// Message to send
    #[arg(long, default_value = "Hello")]
    message: String,

    /// Model name (overrides config)
    #[arg(long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut settings = Settings::load().context("Failed to load configuration")?;
    if let Some(model) = args.model {
        settings.gemini.model = model;
    }

    let client = GeminiClient::new(settings.gemini)?;
    info!("Sending {:?} to {}", args.message, client.model());

    match client
        .generate_content(&[ChatMessage::new(Role::User, args.message)])
        .await
    {
        Ok(reply) => {
            println!("{}", reply);
            Ok(())
        }
        Err(e) => {
            error!("Gemini API error: {:#}", e);
            Err(e)
        }
    }
}
