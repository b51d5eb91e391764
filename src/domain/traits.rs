//! # Domain Traits
//!
//! Abstract interfaces for the chat platform and the content sources.
//! Allows for pluggable implementations in the Infrastructure layer.

use async_trait::async_trait;

use crate::domain::error::BotResult;
use crate::domain::types::{Article, ChannelInfo, RawEvent, UserInfo};

/// Abstract interface for a chat platform transport (e.g., Slack)
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the real-time event stream. `false` means the platform rejected us.
    async fn connect(&self) -> BotResult<bool>;

    /// Returns whatever events arrived since the last call, without blocking.
    async fn read_events(&self) -> BotResult<Vec<RawEvent>>;

    /// Post a message to a channel
    async fn post_message(&self, channel_id: &str, text: &str) -> BotResult<()>;

    /// List every channel visible to the bot, joined or not
    async fn list_channels(&self) -> BotResult<Vec<ChannelInfo>>;

    /// List the workspace users
    async fn list_users(&self) -> BotResult<Vec<UserInfo>>;
}

/// A source of news articles.
#[async_trait]
pub trait ContentProducer: Send + Sync {
    /// Registry name, also the key of the producer's delivery stamp.
    fn name(&self) -> &str;

    /// Searches the upstream source. May return more than `limit` items.
    async fn search(&self, topic: &str, limit: usize, language: &str) -> BotResult<Vec<Article>>;
}
