//! # Bot Engine
//!
//! The control loop. Every tick it drains a batch of events, classifies them, answers at
//! most one command and runs a delivery sweep. A lost event stream is reconnected with
//! exponential backoff while sweeps keep running.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::application::classifier::{Command, EventClassifier};
use crate::application::context::BotContext;
use crate::application::scheduler::SweepReport;
use crate::interface::commands;
use crate::strings::logs;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Reconnect delay that doubles on every failure, capped at `MAX_BACKOFF`.
#[derive(Debug)]
struct Backoff {
    delay: Duration,
    retry_at: Option<Instant>,
}

impl Backoff {
    fn new() -> Self {
        Self {
            delay: INITIAL_BACKOFF,
            retry_at: None,
        }
    }

    /// Schedules the next attempt and returns how long it will wait.
    fn schedule(&mut self, now: Instant) -> Duration {
        let delay = self.delay;
        self.retry_at = Some(now + delay);
        self.delay = (self.delay * 2).min(MAX_BACKOFF);
        delay
    }

    fn ready(&self, now: Instant) -> bool {
        self.retry_at.is_none_or(|at| now >= at)
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickOutcome {
    pub command: Option<Command>,
    pub sweep: SweepReport,
    /// Set when reading events failed; the stream needs reconnecting.
    pub stream_error: Option<String>,
}

pub struct BotEngine {
    ctx: BotContext,
    tick: Duration,
}

impl BotEngine {
    pub fn new(ctx: BotContext) -> Self {
        let tick = Duration::from_secs(ctx.config.system.tick_seconds);
        Self { ctx, tick }
    }

    /// Runs until `shutdown` flips to `true` or its sender is dropped.
    /// A rejected connection is fatal, a dropped one is retried.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.connect().await?;
        let mut connected = true;
        let mut backoff = Backoff::new();

        while !*shutdown.borrow() {
            if !connected && backoff.ready(Instant::now()) {
                match self.connect().await {
                    Ok(()) => {
                        connected = true;
                        backoff.reset();
                    }
                    Err(e) if is_rejection(&e) => return Err(e),
                    Err(e) => {
                        let delay = backoff.schedule(Instant::now());
                        tracing::warn!("{}", logs::reconnecting(delay.as_secs(), &format!("{e:#}")));
                    }
                }
            }

            let outcome = self.tick(Utc::now(), connected, &shutdown).await;
            if !outcome.sweep.is_idle() {
                tracing::info!(
                    delivered = outcome.sweep.delivered.len(),
                    failed = outcome.sweep.failed.len(),
                    posted = outcome.sweep.posted,
                    interrupted = outcome.sweep.interrupted,
                    "Sweep finished"
                );
            }
            if let Some(err) = outcome.stream_error {
                connected = false;
                let delay = backoff.schedule(Instant::now());
                tracing::warn!("{}", logs::reconnecting(delay.as_secs(), &err));
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = tokio::time::sleep(self.tick) => {}
            }
        }

        tracing::info!("{}", logs::SHUTDOWN);
        Ok(())
    }

    async fn connect(&self) -> Result<()> {
        if !self.ctx.transport.connect().await? {
            tracing::error!("{}", logs::CONNECTION_FAILED);
            return Err(anyhow::Error::new(ConnectionRejected));
        }
        tracing::info!("{}", logs::CONNECTED);
        Ok(())
    }

    /// One iteration of the control loop. Events are only read while `connected`.
    pub async fn tick(
        &self,
        now: DateTime<Utc>,
        connected: bool,
        shutdown: &watch::Receiver<bool>,
    ) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        if connected {
            match self.ctx.transport.read_events().await {
                Ok(events) if !events.is_empty() => {
                    tracing::debug!(count = events.len(), "Read events");
                    let monitored = self.ctx.registry.monitored_ids(now).await;
                    outcome.command = {
                        let mut state = self.ctx.state.lock().await;
                        EventClassifier::new(&self.ctx.identity, monitored.as_ref())
                            .classify(&events, &mut state)
                    };
                }
                Ok(_) => {}
                Err(e) => outcome.stream_error = Some(e.to_string()),
            }
        }

        if let Some(command) = &outcome.command {
            if let Err(e) = commands::handle_command(&self.ctx, command).await {
                tracing::error!("Failed to answer command: {:#}", e);
            }
        }

        outcome.sweep = self.ctx.scheduler.sweep(now, shutdown).await;
        outcome
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{}", logs::CONNECTION_FAILED)]
struct ConnectionRejected;

fn is_rejection(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ConnectionRejected>().is_some()
}
