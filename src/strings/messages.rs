//! # Messages
//!
//! Constant strings and format functions for user-facing replies.

use chrono::{DateTime, Utc};

use crate::domain::types::ChannelMeta;

pub const UNABLE_TO_PROCESS: &str = "I am unable to process commands at this time...";

pub fn not_sure(commands: &[&str]) -> String {
    format!(
        "Not sure what you mean? Try one of: {}",
        commands
            .iter()
            .map(|c| format!("`{c}`"))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

pub fn channel_status(meta: &ChannelMeta, default_topic: &str) -> String {
    let topics = if meta.topics.is_empty() {
        format!("_none_ (using `{default_topic}`)")
    } else {
        meta.topics
            .iter()
            .map(|t| format!("`{t}`"))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "*Topics*: {topics}\n*Frequency*: every {} minutes\n*Limit*: {} articles\n*Language*: {}\n*Last update*: {}",
        meta.frequency_minutes,
        meta.limit,
        meta.language,
        last_update(meta.last_update())
    )
}

fn last_update(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "never".to_string())
}

pub const NEWS_QUEUED: &str = "🗞️ News is on its way to this channel.";
pub const NEWS_NOT_MEMBER: &str =
    "I only deliver news to public channels I am a member of. Invite me to one and ask there.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_sure_lists_commands() {
        let msg = not_sure(&["help", "status"]);
        assert!(msg.starts_with("Not sure what you mean?"));
        assert!(msg.contains("`help`"));
        assert!(msg.contains("`status`"));
    }

    #[test]
    fn test_channel_status_defaults() {
        let msg = channel_status(&ChannelMeta::default(), "general news");
        assert!(msg.contains("using `general news`"));
        assert!(msg.contains("every 60 minutes"));
        assert!(msg.contains("never"));
    }
}
