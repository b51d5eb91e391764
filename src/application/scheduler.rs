//! # Delivery Scheduler
//!
//! Walks every (channel, producer) pair and delivers news to the ones that are due.
//! Each pair keeps its own timestamp, so producers never delay one another.
//! A pair is stamped before its fetch starts, and a failed delivery stays stamped.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, watch};

use crate::application::registry::ChannelRegistry;
use crate::application::state::BotState;
use crate::domain::error::BotResult;
use crate::domain::traits::{ContentProducer, Transport};
use crate::infrastructure::producers::{self, ProducerRegistry};

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Pause after each post, keeps us under the platform's rate limit.
    pub post_delay: Duration,
    pub default_topic: String,
}

/// Outcome of one sweep, keyed by (channel id, producer name).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    pub delivered: Vec<(String, String)>,
    pub failed: Vec<(String, String)>,
    pub posted: usize,
    pub interrupted: bool,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        self.delivered.is_empty() && self.failed.is_empty()
    }
}

struct DeliveryRequest {
    topic: String,
    limit: usize,
    language: String,
}

pub struct DeliveryScheduler {
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<BotState>>,
    registry: Arc<ChannelRegistry>,
    producers: ProducerRegistry,
    settings: SchedulerSettings,
}

impl DeliveryScheduler {
    pub fn new(
        transport: Arc<dyn Transport>,
        state: Arc<Mutex<BotState>>,
        registry: Arc<ChannelRegistry>,
        producers: ProducerRegistry,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            transport,
            state,
            registry,
            producers,
            settings,
        }
    }

    /// One pass over every (channel, producer) pair.
    /// Stops between pairs once `shutdown` flips to `true`.
    pub async fn sweep(&self, now: DateTime<Utc>, shutdown: &watch::Receiver<bool>) -> SweepReport {
        let mut report = SweepReport::default();
        if self.producers.is_empty() {
            return report;
        }

        let channels = self.registry.channels(now).await;
        for channel in &channels {
            tracing::debug!(
                channel = %channel.name,
                topics = ?channel.meta.topics,
                frequency = channel.meta.frequency_minutes,
                "Checking channel"
            );
            for producer in self.producers.producers() {
                if *shutdown.borrow() {
                    report.interrupted = true;
                    return report;
                }

                let request = {
                    let mut state = self.state.lock().await;
                    let meta = state.channel_mut(&channel.id);
                    if !meta.is_due(producer.name(), now) {
                        continue;
                    }
                    meta.stamp(producer.name(), now);
                    DeliveryRequest {
                        topic: meta.topic_expression(&self.settings.default_topic),
                        limit: meta.limit as usize,
                        language: meta.language.clone(),
                    }
                };

                let pair = (channel.id.clone(), producer.name().to_string());
                match self.deliver(&channel.id, producer.as_ref(), &request).await {
                    Ok(posted) => {
                        tracing::info!(
                            channel = %channel.name,
                            producer = producer.name(),
                            posted,
                            "Delivered news"
                        );
                        report.posted += posted;
                        report.delivered.push(pair);
                    }
                    Err(e) => {
                        tracing::warn!(channel = %channel.name, "Delivery failed: {}", e);
                        report.failed.push(pair);
                    }
                }
            }
        }

        report
    }

    async fn deliver(
        &self,
        channel_id: &str,
        producer: &dyn ContentProducer,
        request: &DeliveryRequest,
    ) -> BotResult<usize> {
        let articles = producers::fetch(
            producer,
            &request.topic,
            request.limit,
            &request.language,
            &self.settings.default_topic,
        )
        .await?;

        for article in &articles {
            self.transport
                .post_message(channel_id, &article.to_string())
                .await?;
            tokio::time::sleep(self.settings.post_delay).await;
        }
        Ok(articles.len())
    }

    /// Clears every stamp of `channel_id` so the next sweep delivers to it.
    pub async fn request_delivery(&self, channel_id: &str) {
        self.state
            .lock()
            .await
            .channel_mut(channel_id)
            .last_updates
            .clear();
    }
}
