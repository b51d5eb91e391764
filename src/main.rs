//! # Main Entry Point
//!
//! Initializes the application:
//! - Domain: Configuration, Types and Errors
//! - Infrastructure: Slack transport, content producers
//! - Application: Classifier, Registry, Scheduler, Engine
//! - Interface: Command Handlers
//!

mod application;
mod domain;
mod infrastructure;
mod interface;
mod strings;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::application::context::BotContext;
use crate::application::engine::BotEngine;
use crate::domain::config::AppConfig;
use crate::infrastructure::slack::SlackTransport;

const LOG_FILE: &str = "bot.log";

#[derive(Parser, Debug)]
#[command(version, about = "Slack bot that posts news to the channels it is a member of")]
struct Args {
    /// Path to the configuration file
    #[arg(long, default_value = "data/config.yaml")]
    config: String,

    /// Directory for bot.log, overrides `system.log_dir`
    #[arg(long)]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load Configuration
    let mut config = AppConfig::load(&args.config)?;
    if let Some(log_dir) = args.log_dir {
        config.system.log_dir = log_dir;
    }

    // 2. Logging Setup
    let _guard = init_logging(&config.system.log_dir)?;
    tracing::info!("{}", strings::logs::STARTING);

    // 3. Transport and identity
    let token = config.services.slack.resolve_token()?;
    let transport = Arc::new(SlackTransport::new(token, config.system.batch_size)?);
    let ctx = match BotContext::initialize(config, transport).await {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    // 4. Shutdown on Ctrl-C
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Interrupt received"),
            Err(e) => tracing::error!("{}", strings::logs::shutdown_fail(&e.to_string())),
        }
        let _ = shutdown_tx.send(true);
    });

    // 5. Run
    BotEngine::new(ctx).run(shutdown_rx).await
}

fn init_logging(log_dir: &str) -> Result<WorkerGuard> {
    let dir = Path::new(log_dir);
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {log_dir}"))?;
    }

    // Clear previous session log
    let log_path = dir.join(LOG_FILE);
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,hyper=warn,reqwest=warn,tungstenite=warn")
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);
    let console_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(guard)
}
