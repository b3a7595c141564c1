use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use chat_relay_server::app::build_router;
use chat_relay_server::config::Settings;
use chat_relay_server::services::{
    ChatService, ConversationAssembler, GeminiClient, SessionStore, WelcomeExchange,
};
use chat_relay_server::state::AppState;
use chat_relay_server::utils::logger;

#[tokio::main]
async fn main() -> Result<()> {
    // Settings first; the logger is configured from them
    let settings = Settings::load().context("Failed to load configuration")?;
    logger::init_logger(&settings.logging)?;

    info!("🚀 Starting chat relay server...");
    if settings.config_path().exists() {
        info!("✅ Configuration loaded from {}", settings.config_path().display());
    } else {
        info!("✅ Configuration loaded from environment");
    }

    // Initialize services
    let provider = Arc::new(GeminiClient::new(settings.gemini.clone())?);
    info!("✅ Gemini client ready (model: {})", provider.model());

    let store = SessionStore::new(WelcomeExchange::new(
        settings.prompts.welcome_greeting.clone(),
        settings.prompts.welcome_message.clone(),
    ));
    let assembler = ConversationAssembler::from_config(&settings.prompts, &settings.conversation);
    info!(
        "✅ Conversation window: last {} turns, history cap {}",
        assembler.context_window(),
        assembler.history_cap()
    );

    let chat_service = ChatService::new(store, assembler, provider);

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    let static_dir = settings.server.static_dir.clone();

    let app = build_router(AppState::new(chat_service, settings), Some(&static_dir));

    info!("🎯 Chat relay listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Keep serving rather than exiting immediately
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
