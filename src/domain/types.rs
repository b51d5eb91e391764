//! # Domain Types
//!
//! Common data structures used across the application logic: raw platform events,
//! channel listings, per-channel derived metadata and content items.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_FREQUENCY_MINUTES: u32 = 60;
pub const DEFAULT_LIMIT: u32 = 2;
pub const DEFAULT_LANGUAGE: &str = "en";

/// A single inbound event from the chat platform.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Updated purpose text carried by `channel_purpose` messages.
    #[serde(default)]
    pub purpose: Option<String>,
    /// Updated topic text carried by `channel_topic` messages.
    #[serde(default)]
    pub topic: Option<String>,
}

impl RawEvent {
    pub fn is_message(&self) -> bool {
        self.kind == "message"
    }
}

/// One entry of the platform's channel listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub is_member: bool,
    pub topic: String,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
}

/// Structured configuration derived from a channel's topic and purpose text.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelMeta {
    pub topics: Vec<String>,
    pub frequency_minutes: u32,
    pub limit: u32,
    pub language: String,
    /// Last delivery per producer name.
    pub last_updates: HashMap<String, DateTime<Utc>>,
}

impl Default for ChannelMeta {
    fn default() -> Self {
        Self {
            topics: Vec::new(),
            frequency_minutes: DEFAULT_FREQUENCY_MINUTES,
            limit: DEFAULT_LIMIT,
            language: DEFAULT_LANGUAGE.to_string(),
            last_updates: HashMap::new(),
        }
    }
}

impl ChannelMeta {
    /// Restores the directive fields to their defaults. Delivery stamps survive.
    pub fn reset_directives(&mut self) {
        let last_updates = std::mem::take(&mut self.last_updates);
        *self = Self {
            last_updates,
            ..Self::default()
        };
    }

    pub fn frequency(&self) -> Duration {
        Duration::minutes(i64::from(self.frequency_minutes))
    }

    /// A pair is due if it never delivered, or if strictly more than one period has passed.
    pub fn is_due(&self, producer: &str, now: DateTime<Utc>) -> bool {
        match self.last_updates.get(producer) {
            None => true,
            Some(last) => now - *last > self.frequency(),
        }
    }

    pub fn stamp(&mut self, producer: &str, now: DateTime<Utc>) {
        self.last_updates.insert(producer.to_string(), now);
    }

    /// Most recent delivery across every producer.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_updates.values().max().copied()
    }

    /// OR-combination of the topic fragments, or `fallback` when there are none.
    pub fn topic_expression(&self, fallback: &str) -> String {
        if self.topics.is_empty() {
            fallback.to_string()
        } else {
            self.topics.join(" OR ")
        }
    }
}

/// A content item ready to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub text: String,
    pub url: Option<String>,
}

impl Article {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl fmt::Display for Article {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{}\n{}", self.text, url),
            None => f.write_str(&self.text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_boundary() {
        let now = Utc::now();
        let mut meta = ChannelMeta::default();
        assert!(meta.is_due("twitter", now));

        meta.stamp("twitter", now - Duration::minutes(61));
        assert!(meta.is_due("twitter", now));

        meta.stamp("twitter", now - Duration::minutes(59));
        assert!(!meta.is_due("twitter", now));

        // Exactly one period is not yet due
        meta.stamp("twitter", now - Duration::minutes(60));
        assert!(!meta.is_due("twitter", now));
    }

    #[test]
    fn test_stamps_are_per_producer() {
        let now = Utc::now();
        let mut meta = ChannelMeta::default();
        meta.stamp("twitter", now);
        assert!(!meta.is_due("twitter", now));
        assert!(meta.is_due("hackernews", now));
        assert_eq!(meta.last_update(), Some(now));
    }

    #[test]
    fn test_reset_keeps_stamps() {
        let now = Utc::now();
        let mut meta = ChannelMeta {
            topics: vec!["rockets".to_string()],
            frequency_minutes: 5,
            limit: 9,
            language: "de".to_string(),
            ..ChannelMeta::default()
        };
        meta.stamp("twitter", now);
        meta.reset_directives();

        assert!(meta.topics.is_empty());
        assert_eq!(meta.frequency_minutes, DEFAULT_FREQUENCY_MINUTES);
        assert_eq!(meta.limit, DEFAULT_LIMIT);
        assert_eq!(meta.language, DEFAULT_LANGUAGE);
        assert_eq!(meta.last_updates.get("twitter"), Some(&now));
    }

    #[test]
    fn test_topic_expression() {
        let mut meta = ChannelMeta::default();
        assert_eq!(meta.topic_expression("general news"), "general news");
        meta.topics = vec!["rockets".to_string(), "mars".to_string()];
        assert_eq!(meta.topic_expression("general news"), "rockets OR mars");
    }

    #[test]
    fn test_article_display() {
        assert_eq!(Article::new("hello").to_string(), "hello");
        assert_eq!(
            Article::new("hello").with_url("https://x.test").to_string(),
            "hello\nhttps://x.test"
        );
    }

    #[test]
    fn test_raw_event_from_slack_json() {
        let event: RawEvent = serde_json::from_str(
            r#"{"type":"message","subtype":"channel_purpose","user":"U1","channel":"C1",
                "text":"set the channel purpose: topic: rockets","purpose":"topic: rockets"}"#,
        )
        .unwrap();
        assert!(event.is_message());
        assert_eq!(event.subtype.as_deref(), Some("channel_purpose"));
        assert_eq!(event.purpose.as_deref(), Some("topic: rockets"));
        assert!(event.topic.is_none());

        let event: RawEvent = serde_json::from_str(
            r#"{"type":"message","subtype":"channel_topic","user":"U1","channel":"C1",
                "text":"set the channel topic: space","topic":"space"}"#,
        )
        .unwrap();
        assert_eq!(event.topic.as_deref(), Some("space"));
    }
}
