//! # Status Command
//!
//! Shows the settings the scheduler uses for the channel the command came from.

use anyhow::Result;

use crate::application::context::BotContext;
use crate::strings::messages;

pub async fn handle_status(ctx: &BotContext, channel_id: &str) -> Result<()> {
    let meta = ctx
        .state
        .lock()
        .await
        .channel(channel_id)
        .cloned()
        .unwrap_or_default();
    let text = messages::channel_status(&meta, &ctx.config.system.default_topic);
    ctx.reply(channel_id, &text).await
}
