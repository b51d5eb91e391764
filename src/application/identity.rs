//! # Bot Identity
//!
//! Resolves the bot's own user id at startup and recognizes its mention token in message text.

use regex::Regex;

use crate::domain::config::SlackConfig;
use crate::domain::error::{BotError, BotResult};
use crate::domain::traits::Transport;

#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: String,
    /// Matches `<@ID>` and the labelled form `<@ID|name>`.
    mention: Regex,
}

impl BotIdentity {
    pub fn new(id: impl Into<String>) -> BotResult<Self> {
        let id = id.into();
        let mention = Regex::new(&format!(r"<@{}(?:\|[^>]*)?>", regex::escape(&id)))
            .map_err(|e| BotError::FatalConfig(e.to_string()))?;
        Ok(Self { id, mention })
    }

    pub fn is_mentioned(&self, text: &str) -> bool {
        self.mention.is_match(text)
    }

    /// Removes every mention, then trims, lower-cases and space-joins what is left.
    pub fn normalize_command(&self, text: &str) -> String {
        self.mention
            .split(text)
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Uses the configured id, or looks the configured display name up in the user list.
pub async fn resolve_identity(
    config: &SlackConfig,
    transport: &dyn Transport,
) -> BotResult<BotIdentity> {
    if let Some(id) = config.id.as_deref().filter(|id| !id.is_empty()) {
        return BotIdentity::new(id);
    }

    let name = config
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            BotError::FatalConfig("neither services.slack.id nor services.slack.name is set".to_string())
        })?;

    let users = transport
        .list_users()
        .await
        .map_err(|e| BotError::FatalConfig(format!("could not list users: {e}")))?;

    let user = users
        .into_iter()
        .find(|u| u.name == name)
        .ok_or_else(|| BotError::FatalConfig(format!("no user named `{name}`")))?;

    BotIdentity::new(user.id)
}
