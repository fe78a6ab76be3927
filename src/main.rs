//! Clinicdesk: clinic management backend
//!
//! Main entry point: serves the chat endpoints over HTTP.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clinicdesk::adapters::http;
use clinicdesk::adapters::sanitize::SanitizingMakeWriter;
use clinicdesk::adapters::sqlite::SqliteStore;
use clinicdesk::application::ChatService;
use clinicdesk::config::{Config, LogMode};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let (writer, _guard) = match config.log_mode {
        LogMode::File => {
            if let Some(parent) = config.log_file.parent() {
                // Best-effort: an unwritable directory surfaces on open below.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&config.log_file)
                .with_context(|| format!("opening log file {}", config.log_file.display()))?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting clinicdesk...");

    let store = if config.in_memory() {
        tracing::warn!("Using in-memory database; data will not survive a restart");
        SqliteStore::in_memory()?
    } else {
        SqliteStore::new(&config.db_path)
            .with_context(|| format!("opening database {}", config.db_path))?
    };
    let chat = Arc::new(ChatService::new(Arc::new(store)));
    let app = http::router(chat);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Clinicdesk shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
