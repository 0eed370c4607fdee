//! Giftpool daemon
//!
//! Keeps every onboarded person's gift offers in sync with what is still
//! available, and records claims against capacity.

use clap::Parser;
use giftpool_daemon::config::{StorageConfig, TelegramConfig, TransportConfig};
use giftpool_daemon::{DaemonConfig, DaemonError, DaemonResult, Server};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Giftpool daemon CLI
#[derive(Parser)]
#[command(name = "giftpoold")]
#[command(about = "Giftpool daemon - shared gift wishlist with capacity-checked claims", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "GIFTPOOL_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "GIFTPOOL_LISTEN_ADDR")]
    listen: Option<String>,

    /// Directory for JSON state; switches storage to json
    #[arg(long, env = "GIFTPOOL_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Gift content directory
    #[arg(long, env = "GIFTPOOL_CONTENT_ROOT")]
    content_root: Option<PathBuf>,

    /// Telegram bot token; switches transport to telegram
    #[arg(long, env = "GIFTPOOL_TELEGRAM_TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// Log level
    #[arg(long, env = "GIFTPOOL_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "GIFTPOOL_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> DaemonResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| cli.log_level.clone().into());

    if cli.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load configuration
    let mut config = DaemonConfig::load(cli.config.as_deref())
        .map_err(|e| DaemonError::Config(e.to_string()))?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid listen address: {}", e)))?;
    }

    if let Some(dir) = cli.state_dir {
        config.storage = StorageConfig::Json { dir };
    }

    if let Some(root) = cli.content_root {
        config.content.root = root;
    }

    if let Some(token) = cli.telegram_token {
        if let TransportConfig::Telegram(telegram) = &mut config.transport {
            telegram.token = token;
        } else {
            config.transport = TransportConfig::Telegram(TelegramConfig::new(token));
        }
    }

    let transport = match &config.transport {
        TransportConfig::Memory => "memory",
        TransportConfig::Telegram(_) => "telegram",
    };
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.server.listen_addr,
        content = %config.content.root.display(),
        transport,
        "Starting giftpool daemon"
    );

    // Create and run server
    let server = Server::new(config).await?;
    server.run().await
}
