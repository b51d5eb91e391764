//! # Command Handlers
//!
//! Contains specific handler functions for each supported command (help, status, news).
//! `handle_command` picks the handler from the first word of a normalized command.

pub mod help;
pub mod news;
pub mod status;

use anyhow::Result;

use crate::application::classifier::Command;
use crate::application::context::BotContext;
use crate::strings::messages;

pub async fn handle_command(ctx: &BotContext, command: &Command) -> Result<()> {
    let cmd = command.text.split_whitespace().next().unwrap_or_default();
    tracing::info!("Dispatching cmd='{}' channel='{}'", cmd, command.channel);

    let result = match cmd {
        "help" => help::handle_help(ctx, &command.channel).await,
        "status" => status::handle_status(ctx, &command.channel).await,
        "news" => news::handle_news(ctx, &command.channel).await,
        _ => help::handle_unknown(ctx, &command.channel).await,
    };

    if let Err(e) = result {
        tracing::error!("Command `{}` failed: {:#}", cmd, e);
        ctx.reply(&command.channel, messages::UNABLE_TO_PROCESS).await?;
    }
    Ok(())
}
