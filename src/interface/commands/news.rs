//! # News Command
//!
//! Makes every producer due for the requesting channel, so the next sweep delivers.

use anyhow::Result;
use chrono::Utc;
use std::collections::HashSet;

use crate::application::context::BotContext;
use crate::strings::messages;

pub async fn handle_news(ctx: &BotContext, channel_id: &str) -> Result<()> {
    if !is_monitored(ctx, channel_id).await {
        return ctx.reply(channel_id, messages::NEWS_NOT_MEMBER).await;
    }

    ctx.scheduler.request_delivery(channel_id).await;
    ctx.reply(channel_id, messages::NEWS_QUEUED).await
}

/// Checks the cached listing first, then a fresh one in case the bot was just invited.
/// Forced refreshes are throttled by the registry.
async fn is_monitored(ctx: &BotContext, channel_id: &str) -> bool {
    let now = Utc::now();
    let listed = |ids: Option<HashSet<String>>| ids.is_some_and(|ids| ids.contains(channel_id));
    if listed(ctx.registry.monitored_ids(now).await) {
        return true;
    }
    if !ctx.registry.invalidate(now).await {
        return false;
    }
    listed(ctx.registry.monitored_ids(now).await)
}
