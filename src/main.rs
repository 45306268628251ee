//! # ClassTrack — lesson roster admin bot
//!
//! Telegram-driven admin console for a roster of recurring lesson
//! students: log, cancel, reschedule, renew, and pause classes from
//! inline keyboard menus.
//!
//! Usage:
//!   classtrack                          # Run with ~/.classtrack/config.toml
//!   classtrack --config ./dev.toml      # Custom config
//!   classtrack --data-dir ./data -v     # Local data dir, debug logging

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use classtrack_core::BotConfig;
use classtrack_engine::Dispatcher;
use classtrack_store::JsonStore;
use classtrack_telegram::{BotEvent, TelegramChannel};
use futures::StreamExt;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "classtrack", version, about = "🎓 ClassTrack — lesson roster admin bot")]
struct Cli {
    /// Config file (default: ~/.classtrack/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Bot token override (recommended: keep it in the config file)
    #[arg(long)]
    bot_token: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "classtrack=debug"
    } else {
        "classtrack=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => BotConfig::load_from(path)?,
        None => BotConfig::load()?,
    };
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(token) = cli.bot_token {
        config.bot_token = token;
    }
    if config.bot_token.is_empty() {
        anyhow::bail!(
            "No bot token configured. Set bot_token in {}",
            BotConfig::default_path().display()
        );
    }

    let store = JsonStore::new(&config.data_dir);
    let mut dispatcher = Dispatcher::new(store).with_menu_limit(config.menu_limit);

    let sender = TelegramChannel::new(config.bot_token.clone(), config.poll_interval);
    let me = sender.get_me().await?;
    info!(
        "🤖 ClassTrack running as @{}",
        me.username.as_deref().unwrap_or("unknown")
    );
    if config.admin_ids.is_empty() {
        info!("No admin_ids configured; accepting commands from anyone");
    }

    let poller = TelegramChannel::new(config.bot_token.clone(), config.poll_interval);
    let mut events = poller.start_polling();

    while let Some(event) = events.next().await {
        match event {
            BotEvent::Callback {
                operator,
                chat_id,
                message_id,
                callback_id,
                data,
            } => {
                sender.answer_callback(&callback_id).await;
                if !config.is_admin(operator) {
                    debug!("Ignoring callback from non-admin {operator}");
                    continue;
                }
                if let Some(render) = dispatcher.handle_callback(operator, &data) {
                    if let Err(e) = sender.respond(chat_id, Some(message_id), &render).await {
                        error!("Failed to respond to callback: {e}");
                    }
                }
            }
            BotEvent::Text {
                operator,
                chat_id,
                text,
            } => {
                if !config.is_admin(operator) {
                    continue;
                }
                if let Some(render) = dispatcher.handle_message(operator, &text) {
                    if let Err(e) = sender.respond(chat_id, None, &render).await {
                        error!("Failed to respond to message: {e}");
                    }
                }
            }
        }
    }

    Ok(())
}
