//! # Event Classifier
//!
//! Scans one batch of raw platform events and picks out the first command directed at the bot.
//! A message is directed at the bot when it mentions the bot, or when it arrives in a
//! channel that is not monitored for broadcasts (i.e. a direct message).
//! While the channel listing is unknown, only Slack direct-message ids (`D...`) count
//! as unmonitored.
//! Purpose and topic changes are merged into the channel metadata along the way.

use std::collections::HashSet;

use crate::application::identity::BotIdentity;
use crate::application::state::BotState;
use crate::domain::types::RawEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub text: String,
    pub channel: String,
}

pub struct EventClassifier<'a> {
    identity: &'a BotIdentity,
    monitored: Option<&'a HashSet<String>>,
}

const DIRECT_CHANNEL_PREFIX: char = 'D';

impl<'a> EventClassifier<'a> {
    pub fn new(identity: &'a BotIdentity, monitored: Option<&'a HashSet<String>>) -> Self {
        Self { identity, monitored }
    }

    /// Returns the first directed command in `events`, if any.
    ///
    /// The whole batch is always scanned so that every purpose change lands in `state`;
    /// commands after the first one are dropped.
    pub fn classify(&self, events: &[RawEvent], state: &mut BotState) -> Option<Command> {
        let mut found: Option<Command> = None;

        for event in events {
            tracing::debug!(?event, "Classifying event");

            let Some(text) = event.text.as_deref().filter(|t| !t.is_empty()) else {
                continue;
            };
            if !event.is_message() || event.user.as_deref() == Some(self.identity.id.as_str()) {
                continue;
            }
            let Some(channel) = event.channel.as_deref() else {
                continue;
            };

            if let Some(purpose) = &event.purpose {
                state.channel_mut(channel).apply_purpose(purpose);
                tracing::info!(channel, "Channel purpose updated");
                continue;
            }
            if let Some(topic) = &event.topic {
                state.channel_mut(channel).apply_topic(topic);
                tracing::info!(channel, "Channel topic updated");
                continue;
            }

            if !self.is_directed(text, channel) {
                continue;
            }

            let command = Command {
                text: self.identity.normalize_command(text),
                channel: channel.to_string(),
            };
            match &found {
                None => found = Some(command),
                Some(_) => tracing::debug!(?command, "Dropping extra command in batch"),
            }
        }

        found
    }

    fn is_directed(&self, text: &str, channel: &str) -> bool {
        if self.identity.is_mentioned(text) {
            return true;
        }
        match self.monitored {
            Some(monitored) => !monitored.contains(channel),
            None => channel.starts_with(DIRECT_CHANNEL_PREFIX),
        }
    }
}
