//! # Channel Registry
//!
//! Caches the set of channels the bot is a member of and re-derives their metadata
//! whenever the cached listing is older than the refresh TTL.
//! Metadata itself lives in `BotState`, so incremental updates are visible immediately.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::application::state::BotState;
use crate::domain::error::BotResult;
use crate::domain::traits::Transport;
use crate::domain::types::{ChannelInfo, ChannelMeta};

/// Minimum wait before retrying a failed refresh, and between two forced refreshes.
const RETRY_AFTER_FAILURE_SECS: i64 = 60;

/// Immutable result of one full channel listing.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    pub fetched_at: DateTime<Utc>,
    pub channels: Vec<ChannelInfo>,
}

impl ChannelSnapshot {
    fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at > ttl
    }
}

/// A member channel together with its live metadata.
#[derive(Debug, Clone)]
pub struct ChannelDescriptor {
    pub id: String,
    pub name: String,
    pub meta: ChannelMeta,
}

#[derive(Default)]
struct Cache {
    snapshot: Option<Arc<ChannelSnapshot>>,
    failed_at: Option<DateTime<Utc>>,
    forced: bool,
    last_forced: Option<DateTime<Utc>>,
}

pub struct ChannelRegistry {
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<BotState>>,
    ttl: Duration,
    cache: Mutex<Cache>,
}

impl ChannelRegistry {
    pub fn new(transport: Arc<dyn Transport>, state: Arc<Mutex<BotState>>, ttl: Duration) -> Self {
        Self {
            transport,
            state,
            ttl,
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Member channels in listing order, with their current metadata.
    pub async fn channels(&self, now: DateTime<Utc>) -> Vec<ChannelDescriptor> {
        let Some(snapshot) = self.snapshot(now).await else {
            return Vec::new();
        };
        let mut state = self.state.lock().await;
        snapshot
            .channels
            .iter()
            .map(|c| ChannelDescriptor {
                id: c.id.clone(),
                name: c.name.clone(),
                meta: state.channel_mut(&c.id).clone(),
            })
            .collect()
    }

    /// Ids of the broadcast channels, or `None` while no listing has ever succeeded.
    pub async fn monitored_ids(&self, now: DateTime<Utc>) -> Option<HashSet<String>> {
        self.snapshot(now)
            .await
            .map(|s| s.channels.iter().map(|c| c.id.clone()).collect())
    }

    /// Forces the next access to fetch a fresh listing, at most once per
    /// `RETRY_AFTER_FAILURE_SECS`. Returns whether a refresh was scheduled.
    /// The current snapshot stays in use if that fetch fails.
    pub async fn invalidate(&self, now: DateTime<Utc>) -> bool {
        let mut cache = self.cache.lock().await;
        let throttled = cache
            .last_forced
            .is_some_and(|at| now - at < Duration::seconds(RETRY_AFTER_FAILURE_SECS));
        if throttled {
            tracing::debug!("Forced channel refresh throttled");
            return false;
        }
        cache.forced = true;
        cache.last_forced = Some(now);
        true
    }

    /// Returns the cached snapshot, refreshing it first when stale.
    /// A failed refresh keeps whatever was cached before.
    pub async fn snapshot(&self, now: DateTime<Utc>) -> Option<Arc<ChannelSnapshot>> {
        let mut cache = self.cache.lock().await;

        let stale = cache.forced
            || cache
                .snapshot
                .as_ref()
                .is_none_or(|s| s.is_stale(now, self.ttl));
        let backing_off = cache
            .failed_at
            .is_some_and(|at| now - at < Duration::seconds(RETRY_AFTER_FAILURE_SECS));

        if stale && !backing_off {
            cache.forced = false;
            match self.refresh(now).await {
                Ok(snapshot) => {
                    cache.snapshot = Some(Arc::new(snapshot));
                    cache.failed_at = None;
                }
                Err(e) => {
                    tracing::warn!(
                        "Channel refresh failed, keeping previous listing: {}",
                        e
                    );
                    cache.failed_at = Some(now);
                }
            }
        }

        cache.snapshot.clone()
    }

    async fn refresh(&self, now: DateTime<Utc>) -> BotResult<ChannelSnapshot> {
        let channels: Vec<ChannelInfo> = self
            .transport
            .list_channels()
            .await?
            .into_iter()
            .filter(|c| c.is_member)
            .collect();

        let mut state = self.state.lock().await;
        for channel in &channels {
            state
                .channel_mut(&channel.id)
                .rederive(&channel.topic, &channel.purpose);
        }
        tracing::info!(count = channels.len(), "Channel listing refreshed");

        Ok(ChannelSnapshot {
            fetched_at: now,
            channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockTransport, channel};
    use std::sync::atomic::Ordering;

    fn registry(transport: Arc<MockTransport>) -> (ChannelRegistry, Arc<Mutex<BotState>>) {
        let state = Arc::new(Mutex::new(BotState::default()));
        let registry = ChannelRegistry::new(transport, state.clone(), Duration::minutes(10));
        (registry, state)
    }

    #[tokio::test]
    async fn test_only_member_channels_are_listed() {
        let mut outsider = channel("C2", "", "");
        outsider.is_member = false;
        let transport = Arc::new(MockTransport::with_channels(vec![
            channel("C1", "space", "topic: rockets\nlimit: 1"),
            outsider,
        ]));
        let (registry, _) = registry(transport);

        let channels = registry.channels(Utc::now()).await;
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "C1");
        assert_eq!(channels[0].meta.topics, vec!["space", "rockets"]);
        assert_eq!(channels[0].meta.limit, 1);
    }

    #[tokio::test]
    async fn test_listing_is_cached_until_ttl() {
        let transport = Arc::new(MockTransport::with_channels(vec![channel("C1", "", "")]));
        let (registry, _) = registry(transport.clone());
        let t0 = Utc::now();

        registry.channels(t0).await;
        registry.channels(t0 + Duration::minutes(9)).await;
        assert_eq!(transport.list_calls(), 1);

        registry.channels(t0 + Duration::minutes(11)).await;
        assert_eq!(transport.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_incremental_updates_visible_between_refreshes() {
        let transport = Arc::new(MockTransport::with_channels(vec![channel("C1", "", "")]));
        let (registry, state) = registry(transport);
        let t0 = Utc::now();
        registry.channels(t0).await;

        state.lock().await.channel_mut("C1").apply_purpose("frequency: 15");

        let channels = registry.channels(t0 + Duration::minutes(1)).await;
        assert_eq!(channels[0].meta.frequency_minutes, 15);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let transport = Arc::new(MockTransport::with_channels(vec![channel("C1", "", "")]));
        let (registry, _) = registry(transport.clone());
        let t0 = Utc::now();
        registry.channels(t0).await;

        transport.fail_listing.store(true, Ordering::SeqCst);
        let channels = registry.channels(t0 + Duration::minutes(11)).await;
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].id, "C1");

        // Backs off instead of hammering the platform on every access
        registry.channels(t0 + Duration::minutes(11) + Duration::seconds(5)).await;
        assert_eq!(transport.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_first_refresh_yields_empty_listing() {
        let transport = Arc::new(MockTransport::with_channels(vec![channel("C1", "", "")]));
        transport.fail_listing.store(true, Ordering::SeqCst);
        let (registry, _) = registry(transport);
        assert!(registry.channels(Utc::now()).await.is_empty());
        assert!(registry.monitored_ids(Utc::now()).await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_replays_metadata_but_keeps_stamps() {
        let transport = Arc::new(MockTransport::with_channels(vec![channel(
            "C1",
            "",
            "topic: rockets",
        )]));
        let (registry, state) = registry(transport);
        let t0 = Utc::now();
        registry.channels(t0).await;

        {
            let mut guard = state.lock().await;
            let meta = guard.channel_mut("C1");
            meta.apply_purpose("topic: extra");
            meta.stamp("twitter", t0);
        }

        assert!(registry.invalidate(t0).await);
        let channels = registry.channels(t0).await;
        assert_eq!(channels[0].meta.topics, vec!["rockets"]);
        assert_eq!(channels[0].meta.last_updates.get("twitter"), Some(&t0));
    }

    #[tokio::test]
    async fn test_forced_refresh_is_throttled() {
        let transport = Arc::new(MockTransport::with_channels(vec![channel("C1", "", "")]));
        let (registry, _) = registry(transport.clone());
        let t0 = Utc::now();
        registry.channels(t0).await;

        assert!(registry.invalidate(t0).await);
        registry.channels(t0).await;
        assert_eq!(transport.list_calls(), 2);

        // A second request inside the window does not hit the platform again
        assert!(!registry.invalidate(t0 + Duration::seconds(10)).await);
        registry.channels(t0 + Duration::seconds(10)).await;
        assert_eq!(transport.list_calls(), 2);

        assert!(registry.invalidate(t0 + Duration::seconds(61)).await);
        registry.channels(t0 + Duration::seconds(61)).await;
        assert_eq!(transport.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_monitored_ids_after_successful_listing() {
        let transport = Arc::new(MockTransport::with_channels(vec![channel("C1", "", "")]));
        let (registry, _) = registry(transport);
        let ids = registry.monitored_ids(Utc::now()).await.unwrap();
        assert!(ids.contains("C1"));
    }
}
