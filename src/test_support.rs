//! Test doubles for the transport and content producers.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::application::context::BotContext;
use crate::application::identity::BotIdentity;
use crate::domain::config::AppConfig;
use crate::domain::error::{BotError, BotResult};
use crate::domain::traits::{ContentProducer, Transport};
use crate::infrastructure::producers::ProducerRegistry;
use crate::domain::types::{Article, ChannelInfo, RawEvent, UserInfo};

/// Records posts and serves scripted listings and event batches.
#[derive(Default)]
pub struct MockTransport {
    pub channels: Mutex<Vec<ChannelInfo>>,
    pub users: Vec<UserInfo>,
    pub batches: Mutex<VecDeque<Vec<RawEvent>>>,
    pub posts: Mutex<Vec<(String, String)>>,
    pub fail_listing: AtomicBool,
    pub fail_users: AtomicBool,
    pub reject_connect: AtomicBool,
    pub stream_closed: AtomicBool,
    /// Number of upcoming posts to reject.
    pub fail_posts: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub connect_calls: AtomicUsize,
}

impl MockTransport {
    pub fn with_channels(channels: Vec<ChannelInfo>) -> Self {
        Self {
            channels: Mutex::new(channels),
            ..Self::default()
        }
    }

    pub fn push_batch(&self, events: Vec<RawEvent>) {
        self.batches.lock().unwrap().push_back(events);
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn connect_calls(&self) -> usize {
        self.connect_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn connect(&self) -> BotResult<bool> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        Ok(!self.reject_connect.load(Ordering::SeqCst))
    }

    async fn read_events(&self) -> BotResult<Vec<RawEvent>> {
        if self.stream_closed.load(Ordering::SeqCst) {
            return Err(BotError::Transport("event stream closed".to_string()));
        }
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn post_message(&self, channel_id: &str, text: &str) -> BotResult<()> {
        let rejected = self
            .fail_posts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(BotError::Transport("chat.postMessage failed".to_string()));
        }
        self.posts
            .lock()
            .unwrap()
            .push((channel_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn list_channels(&self) -> BotResult<Vec<ChannelInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(BotError::Transport("channel listing unavailable".to_string()));
        }
        Ok(self.channels.lock().unwrap().clone())
    }

    async fn list_users(&self) -> BotResult<Vec<UserInfo>> {
        if self.fail_users.load(Ordering::SeqCst) {
            return Err(BotError::Transport("users.list failed".to_string()));
        }
        Ok(self.users.clone())
    }
}

/// Returns a fixed list of articles and records every call.
pub struct MockProducer {
    pub name: String,
    pub articles: Vec<Article>,
    pub fail: bool,
    pub calls: Mutex<Vec<(String, usize, String)>>,
}

impl MockProducer {
    pub fn new(name: &str, texts: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            articles: texts.iter().map(|t| Article::new(*t)).collect(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name, &[])
        }
    }

    pub fn calls(&self) -> Vec<(String, usize, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentProducer for MockProducer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, topic: &str, limit: usize, language: &str) -> BotResult<Vec<Article>> {
        self.calls
            .lock()
            .unwrap()
            .push((topic.to_string(), limit, language.to_string()));
        if self.fail {
            return Err(BotError::producer(&self.name, "upstream down"));
        }
        Ok(self.articles.clone())
    }
}

pub fn channel(id: &str, topic: &str, purpose: &str) -> ChannelInfo {
    ChannelInfo {
        id: id.to_string(),
        name: format!("chan-{id}"),
        is_member: true,
        topic: topic.to_string(),
        purpose: purpose.to_string(),
    }
}

pub fn message(user: &str, channel: &str, text: &str) -> RawEvent {
    RawEvent {
        kind: "message".to_string(),
        user: Some(user.to_string()),
        channel: Some(channel.to_string()),
        text: Some(text.to_string()),
        ..RawEvent::default()
    }
}

pub fn purpose_change(user: &str, channel: &str, purpose: &str) -> RawEvent {
    RawEvent {
        subtype: Some("channel_purpose".to_string()),
        purpose: Some(purpose.to_string()),
        ..message(user, channel, &format!("set the channel purpose: {purpose}"))
    }
}

pub fn topic_change(user: &str, channel: &str, topic: &str) -> RawEvent {
    RawEvent {
        subtype: Some("channel_topic".to_string()),
        topic: Some(topic.to_string()),
        ..message(user, channel, &format!("set the channel topic: {topic}"))
    }
}

pub const BOT_ID: &str = "UBOT";

pub fn test_config() -> AppConfig {
    serde_yaml::from_str(
        r#"
services:
  slack:
    id: UBOT
system:
  post_delay_seconds: 0
  tick_seconds: 1
"#,
    )
    .unwrap()
}

pub fn test_context(
    transport: Arc<MockTransport>,
    producers: Vec<Arc<dyn ContentProducer>>,
) -> BotContext {
    BotContext::new(
        test_config(),
        transport,
        BotIdentity::new(BOT_ID).unwrap(),
        ProducerRegistry::from_producers(producers),
    )
}
