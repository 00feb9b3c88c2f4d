use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;

use chat_notify_gateway::bot::{ensure_webhook, log_available_chats};
use chat_notify_gateway::config::Settings;
use chat_notify_gateway::server::{create_app, AppState};
use chat_notify_gateway::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing
    let _telemetry = init_telemetry(&settings.otel)?;
    tracing::info!(default_chats = settings.bot.chat_ids.len(), "Configuration loaded");
    if settings.bot.chat_ids.is_empty() {
        tracing::warn!("No default chat ids configured; requests must name their chats");
    }

    // Create application state
    let state = AppState::new(settings.clone())?;
    let bot = state.dispatcher.default_client();
    tracing::info!("Application state initialized");

    if let Err(e) = ensure_webhook(bot.as_ref(), &settings).await {
        tracing::error!(error = %e, "Failed to register webhook");
    }

    if settings.bot.log_chats_on_startup {
        log_available_chats(bot.as_ref(), &settings.bot.chat_ids).await;
    }

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler())
        .await?;

    tracing::info!("Shutting down bot...");
    bot.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
