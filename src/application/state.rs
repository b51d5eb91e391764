//! # Bot State
//!
//! Defines the in-memory state of the application (`BotState`): one `ChannelMeta` per known channel.
//! Nothing here is persisted; the registry rebuilds it from live channel metadata.

use std::collections::HashMap;

use crate::domain::types::ChannelMeta;

/// Maps channel ids to their derived metadata.
#[derive(Debug, Default, Clone)]
pub struct BotState {
    pub channels: HashMap<String, ChannelMeta>,
}

impl BotState {
    /// Gets or creates the metadata for a specific channel.
    pub fn channel_mut(&mut self, channel_id: &str) -> &mut ChannelMeta {
        self.channels.entry(channel_id.to_string()).or_default()
    }

    pub fn channel(&self, channel_id: &str) -> Option<&ChannelMeta> {
        self.channels.get(channel_id)
    }
}
