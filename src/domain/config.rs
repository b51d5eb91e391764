//! # Configuration
//!
//! Manages the loading and parsing of the application's configuration file (`config.yaml`).
//! Defines the structs for the Slack service, the content producers, and system settings.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Main application configuration structure.
/// Matches the layout of `data/config.yaml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub services: ServicesConfig,
    #[serde(default)]
    pub producers: ProducersConfig,
    #[serde(default)]
    pub system: SystemConfig,
}

impl AppConfig {
    /// Reads and parses the YAML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| crate::strings::logs::config_read_error(&path.display().to_string()))?;
        let mut config: Self =
            serde_yaml::from_str(&content).context(crate::strings::logs::CONFIG_PARSE_ERROR)?;
        config.system.clamp();
        Ok(config)
    }
}

/// Configuration for the connected chat service.
#[derive(Debug, Deserialize, Clone)]
pub struct ServicesConfig {
    pub slack: SlackConfig,
}

/// Specific configuration for the Slack service.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SlackConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub token_env: Option<String>, // e.g. "SLACK_BOT_TOKEN"
    /// Bot user id (`U...`). Takes precedence over `name`.
    #[serde(default)]
    pub id: Option<String>,
    /// Bot display name, resolved to an id through `users.list` at startup.
    #[serde(default)]
    pub name: Option<String>,
}

impl SlackConfig {
    /// Resolves the bot token from `token` or the environment variable named by `token_env`.
    pub fn resolve_token(&self) -> Result<String> {
        if let Some(token) = self.token.as_deref().filter(|t| !t.is_empty()) {
            return Ok(token.to_string());
        }
        if let Some(env_var) = &self.token_env {
            return std::env::var(env_var)
                .with_context(|| crate::strings::logs::missing_env_var(env_var));
        }
        anyhow::bail!(crate::strings::logs::MISSING_SLACK_TOKEN)
    }
}

pub type ProducersConfig = HashMap<String, ProducerConfig>;

/// One block per content producer. Only the producer itself interprets it.
#[derive(Debug, Deserialize, Clone)]
pub struct ProducerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_env: Option<String>, // e.g. "TWITTER_BEARER_TOKEN"
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
    /// Additional producer-specific parameters
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            api_key: None,
            api_key_env: None,
            endpoint: None,
            timeout: None,
            extra: HashMap::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

/// System-level settings for the bot.
#[derive(Debug, Deserialize, Clone)]
pub struct SystemConfig {
    /// Sleep between control loop iterations.
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: u64,
    /// Pause after every posted article.
    #[serde(default = "default_post_delay_seconds")]
    pub post_delay_seconds: u64,
    /// How long the channel listing is cached before it is fetched again.
    #[serde(default = "default_refresh_minutes")]
    pub refresh_minutes: i64,
    /// Maximum number of events classified per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Query used when a channel has no topics.
    #[serde(default = "default_topic")]
    pub default_topic: String,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            tick_seconds: default_tick_seconds(),
            post_delay_seconds: default_post_delay_seconds(),
            refresh_minutes: default_refresh_minutes(),
            batch_size: default_batch_size(),
            default_topic: default_topic(),
            log_dir: default_log_dir(),
        }
    }
}

impl SystemConfig {
    /// Raises interval and size settings to at least 1.
    fn clamp(&mut self) {
        if self.tick_seconds < 1 || self.refresh_minutes < 1 || self.batch_size < 1 {
            tracing::warn!(
                tick_seconds = self.tick_seconds,
                refresh_minutes = self.refresh_minutes,
                batch_size = self.batch_size,
                "System settings below 1 raised to 1"
            );
        }
        self.tick_seconds = self.tick_seconds.max(1);
        self.refresh_minutes = self.refresh_minutes.max(1);
        self.batch_size = self.batch_size.max(1);
    }
}

fn default_tick_seconds() -> u64 {
    1
}
fn default_post_delay_seconds() -> u64 {
    1
}
fn default_refresh_minutes() -> i64 {
    10
}
fn default_batch_size() -> usize {
    100
}
fn default_topic() -> String {
    "general news".to_string()
}
fn default_log_dir() -> String {
    "data".to_string()
}
