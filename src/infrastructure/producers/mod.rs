//! # Content Producers
//!
//! Contains implementations for specific news sources (Twitter, Hacker News) and the
//! registry that builds them from configuration.
//! Each producer module exports:
//! - `NAME` - Registry key, also used in `config.yaml` under `producers:`
//! - `build()` - Constructor taking the producer's configuration block

pub mod hackernews;
pub mod twitter;

use std::sync::Arc;
use std::time::Duration;

use crate::domain::config::{ProducerConfig, ProducersConfig};
use crate::domain::error::{BotError, BotResult};
use crate::domain::traits::ContentProducer;
use crate::domain::types::Article;

pub type Constructor = fn(&ProducerConfig) -> BotResult<Arc<dyn ContentProducer>>;

/// Every producer the bot knows how to build, in discovery order.
pub const AVAILABLE: &[(&str, Constructor)] = &[
    (twitter::NAME, twitter::build),
    (hackernews::NAME, hackernews::build),
];

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Producers that were successfully constructed at startup.
#[derive(Clone, Default)]
pub struct ProducerRegistry {
    producers: Vec<Arc<dyn ContentProducer>>,
}

impl ProducerRegistry {
    pub fn discover(config: &ProducersConfig) -> Self {
        Self::discover_from(AVAILABLE, config)
    }

    /// Builds every configured and enabled producer in `available`.
    /// A producer that fails to construct is skipped with a warning.
    pub fn discover_from(available: &[(&str, Constructor)], config: &ProducersConfig) -> Self {
        for name in config.keys() {
            if !available.iter().any(|(known, _)| *known == name.as_str()) {
                tracing::warn!("Unknown producer `{}` in configuration, ignoring", name);
            }
        }

        let mut producers = Vec::new();
        for (name, build) in available {
            let Some(producer_config) = config.get(*name) else {
                continue;
            };
            if !producer_config.enabled {
                tracing::info!("Producer `{}` is disabled", name);
                continue;
            }
            match build(producer_config) {
                Ok(producer) => {
                    tracing::info!("Registered producer `{}`", name);
                    producers.push(producer);
                }
                Err(e) => tracing::warn!("Skipping producer: {}", e),
            }
        }

        Self { producers }
    }

    pub fn from_producers(producers: Vec<Arc<dyn ContentProducer>>) -> Self {
        Self { producers }
    }

    pub fn producers(&self) -> &[Arc<dyn ContentProducer>] {
        &self.producers
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}

/// Searches `producer`, substituting `default_topic` for a blank topic and
/// truncating the result to `limit` items.
pub async fn fetch(
    producer: &dyn ContentProducer,
    topic: &str,
    limit: usize,
    language: &str,
    default_topic: &str,
) -> BotResult<Vec<Article>> {
    let topic = if topic.trim().is_empty() {
        default_topic
    } else {
        topic
    };
    let mut articles = producer.search(topic, limit, language).await?;
    articles.truncate(limit);
    Ok(articles)
}

/// Reads the API key from `api_key` or the environment variable named by `api_key_env`.
pub(crate) fn resolve_api_key(producer: &str, config: &ProducerConfig) -> BotResult<String> {
    if let Some(key) = config.api_key.as_deref().filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    if let Some(env_var) = &config.api_key_env {
        return std::env::var(env_var).map_err(|e| {
            BotError::producer_init(producer, format!("API key env var {env_var} not set: {e}"))
        });
    }
    Err(BotError::producer_init(
        producer,
        "No API key provided - set api_key or api_key_env",
    ))
}

pub(crate) fn http_client(producer: &str, config: &ProducerConfig) -> BotResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS)))
        .build()
        .map_err(|e| BotError::producer_init(producer, e))
}
