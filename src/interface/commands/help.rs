//! # Help Command
//!
//! Handles the `help` command and anything the bot does not recognize.

use anyhow::Result;

use crate::application::context::BotContext;
use crate::strings::{help, messages};

pub async fn handle_help(ctx: &BotContext, channel_id: &str) -> Result<()> {
    ctx.reply(channel_id, &help::main_help()).await
}

pub async fn handle_unknown(ctx: &BotContext, channel_id: &str) -> Result<()> {
    ctx.reply(channel_id, &messages::not_sure(&help::command_names()))
        .await
}
