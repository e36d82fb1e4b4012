//! Scheduler loop — drives all devices on a fixed interval and applies
//! entity-change notifications as they arrive.
//!
//! Two producers feed the per-device pipeline: the tick timer and the
//! state-change stream. Per-device work within a tick runs concurrently,
//! bounded by a worker limit so a large fleet cannot saturate the
//! transport. A device tick that exceeds its deadline is abandoned and
//! counted as unreachable without blocking other devices or the next
//! tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, broadcast};
use tokio::time::Instant;

use castkeep_domain::event::StateChange;
use castkeep_domain::time::now;

use crate::controller::CastController;
use crate::ports::{CastTransport, StateStore};
use crate::settings::RuntimeSettings;

/// Tuning knobs for the scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Maximum devices processed concurrently within one tick.
    pub worker_limit: usize,
    /// Deadline for one device's probe-decide-act sequence.
    pub device_timeout: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            worker_limit: 4,
            device_timeout: Duration::from_secs(20),
        }
    }
}

/// Periodic driver plus asynchronous event listener over one controller.
pub struct Scheduler<T, S> {
    controller: Arc<CastController<T, S>>,
    settings: Arc<RuntimeSettings>,
    options: SchedulerOptions,
    workers: Arc<Semaphore>,
}

impl<T, S> Scheduler<T, S>
where
    T: CastTransport + Clone + Send + Sync + 'static,
    S: StateStore + Send + Sync + 'static,
{
    /// Create a scheduler with default options.
    pub fn new(controller: Arc<CastController<T, S>>, settings: Arc<RuntimeSettings>) -> Self {
        Self::with_options(controller, settings, SchedulerOptions::default())
    }

    /// Create a scheduler with explicit options.
    pub fn with_options(
        controller: Arc<CastController<T, S>>,
        settings: Arc<RuntimeSettings>,
        options: SchedulerOptions,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(options.worker_limit.max(1)));
        Self {
            controller,
            settings,
            options,
            workers,
        }
    }

    /// Run forever: tick all devices on the configured interval and apply
    /// state changes as they arrive. The interval is re-read from the
    /// runtime settings after every tick, so changes apply without a
    /// restart.
    pub async fn run(&self, mut events: broadcast::Receiver<StateChange>) {
        let mut next_tick = Instant::now();
        loop {
            tokio::select! {
                () = tokio::time::sleep_until(next_tick) => {
                    self.run_tick().await;
                    next_tick = Instant::now() + self.settings.cast_interval();
                }
                received = events.recv() => match received {
                    Ok(change) => self.handle_change(&change).await,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "state-change stream lagged, changes dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        tracing::info!("state-change stream closed, continuing on tick cadence only");
        loop {
            tokio::time::sleep_until(next_tick).await;
            self.run_tick().await;
            next_tick = Instant::now() + self.settings.cast_interval();
        }
    }

    /// Process a single tick over all devices.
    pub async fn run_tick(&self) {
        let local = chrono::Local::now().time();
        if !self.controller.global_allows(local).await {
            tracing::debug!("global gate closed, skipping all devices this tick");
            return;
        }

        let tick_time = now();
        let mut tasks = tokio::task::JoinSet::new();
        for name in self.controller.device_names() {
            let controller = Arc::clone(&self.controller);
            let workers = Arc::clone(&self.workers);
            let deadline = self.options.device_timeout;
            tasks.spawn(async move {
                let Ok(_permit) = workers.acquire().await else {
                    return;
                };
                let ticked =
                    tokio::time::timeout(deadline, controller.tick_device(&name, tick_time, local))
                        .await;
                if ticked.is_err() {
                    tracing::warn!(device = %name, "device tick exceeded deadline, abandoned");
                    controller.record_abandoned(&name, deadline).await;
                }
            });
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined {
                tracing::error!(error = %err, "device tick task failed");
            }
        }
    }

    /// Apply one state change, then give every affected device an
    /// immediate off-cycle tick so the override takes effect without
    /// waiting a full interval.
    async fn handle_change(&self, change: &StateChange) {
        let affected = self.controller.handle_state_change(change, now()).await;
        if affected.is_empty() {
            return;
        }

        let local = chrono::Local::now().time();
        if !self.controller.global_allows(local).await {
            tracing::debug!("global gate closed, override takes effect at next allowed tick");
            return;
        }
        for name in affected {
            let deadline = self.options.device_timeout;
            let ticked =
                tokio::time::timeout(deadline, self.controller.tick_device(&name, now(), local))
                    .await;
            if ticked.is_err() {
                tracing::warn!(device = %name, "off-cycle tick exceeded deadline, abandoned");
                self.controller.record_abandoned(&name, deadline).await;
            }
        }
    }
}
