use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskr::cache::spawn_cleanup_task;
use taskr::config::Config;
use taskr::store::memory::{MemoryTaskStore, MemoryUserStore};
use taskr::AppState;

#[derive(Parser, Debug)]
#[command(name = "taskr")]
#[command(author, version, about = "A lightweight task management backend", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "taskr.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the JWT signing secret
    #[arg(long, env = "TASKR_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(&cli.config)?;
    if cli.jwt_secret.is_some() {
        config.auth.jwt_secret = cli.jwt_secret;
    }
    // Refuse to start without a signing secret
    config.validate()?;

    // Initialize logging
    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Taskr v{}", env!("CARGO_PKG_VERSION"));

    // Create app state with in-memory stores
    let users = Arc::new(MemoryUserStore::new());
    let tasks = Arc::new(MemoryTaskStore::new());
    let state = Arc::new(AppState::new(config.clone(), users, tasks)?);

    // Periodic cache sweeps only matter when entries can expire
    if config.cache.ttl_seconds.is_some() {
        spawn_cleanup_task(state.profile_cache.clone(), config.cache.cleanup_interval);
        spawn_cleanup_task(state.task_cache.clone(), config.cache.cleanup_interval);
    }

    // Create API router
    let app = taskr::api::create_router(state);

    // Start API server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
