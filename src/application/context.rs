//! # Bot Context
//!
//! Owns everything the control loop and the command handlers share: the transport,
//! the bot's identity, the channel metadata map, the channel registry and the scheduler.

use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::identity::{self, BotIdentity};
use crate::application::registry::ChannelRegistry;
use crate::application::scheduler::{DeliveryScheduler, SchedulerSettings};
use crate::application::state::BotState;
use crate::domain::config::AppConfig;
use crate::domain::error::BotResult;
use crate::domain::traits::Transport;
use crate::infrastructure::producers::ProducerRegistry;

pub struct BotContext {
    pub config: AppConfig,
    pub transport: Arc<dyn Transport>,
    pub identity: BotIdentity,
    pub state: Arc<Mutex<BotState>>,
    pub registry: Arc<ChannelRegistry>,
    pub scheduler: DeliveryScheduler,
}

impl BotContext {
    /// Resolves the bot identity and discovers the configured producers.
    pub async fn initialize(config: AppConfig, transport: Arc<dyn Transport>) -> BotResult<Self> {
        let identity = identity::resolve_identity(&config.services.slack, transport.as_ref()).await?;
        tracing::info!("{}", crate::strings::logs::identity_resolved(&identity.id));

        let producers = ProducerRegistry::discover(&config.producers);
        if producers.is_empty() {
            tracing::warn!("{}", crate::strings::logs::NO_PRODUCERS);
        }

        Ok(Self::new(config, transport, identity, producers))
    }

    pub fn new(
        config: AppConfig,
        transport: Arc<dyn Transport>,
        identity: BotIdentity,
        producers: ProducerRegistry,
    ) -> Self {
        let state = Arc::new(Mutex::new(BotState::default()));
        let registry = Arc::new(ChannelRegistry::new(
            transport.clone(),
            state.clone(),
            Duration::minutes(config.system.refresh_minutes),
        ));
        let scheduler = DeliveryScheduler::new(
            transport.clone(),
            state.clone(),
            registry.clone(),
            producers,
            SchedulerSettings {
                post_delay: std::time::Duration::from_secs(config.system.post_delay_seconds),
                default_topic: config.system.default_topic.clone(),
            },
        );

        Self {
            config,
            transport,
            identity,
            state,
            registry,
            scheduler,
        }
    }

    /// Posts `text` to `channel_id`.
    pub async fn reply(&self, channel_id: &str, text: &str) -> anyhow::Result<()> {
        self.transport.post_message(channel_id, text).await?;
        Ok(())
    }
}
