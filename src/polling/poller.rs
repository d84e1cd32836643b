//! Fixed-interval background poller.
//!
//! Each tick body runs as its own task so a slow request never delays the
//! schedule; overlapping bodies are allowed. Stopping bumps a generation
//! counter and aborts the loop. Bodies that already started observe the
//! bump through their [`PollToken`].

use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Configuration for a single poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between two ticks.
    pub interval: Duration,
    /// Whether the poller runs at all.
    pub enabled: bool,
    /// Fire the first tick right away instead of after one interval.
    pub fire_immediately: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            enabled: true,
            fire_immediately: false,
        }
    }
}

/// Handed to every tick body; tells it whether its cycle is still current.
#[derive(Debug, Clone)]
pub struct PollToken {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl PollToken {
    /// `false` once the poller that issued this token was stopped or restarted.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.generation.load(Ordering::SeqCst) == self.issued
    }
}

/// Owns at most one polling loop at a time.
pub struct Poller {
    name: &'static str,
    config: PollConfig,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Poller {
    /// Create an idle poller.
    #[must_use]
    pub fn new(name: &'static str, config: PollConfig) -> Self {
        Self {
            name,
            config,
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    /// Start a new cycle, replacing any running one.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&self, tick: F)
    where
        F: Fn(PollToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.stop();

        if !self.config.enabled {
            info!(poller = self.name, "Polling is disabled");
            return;
        }
        if self.config.interval.is_zero() {
            warn!(poller = self.name, "Refusing to poll with a zero interval");
            return;
        }

        let token = PollToken {
            generation: Arc::clone(&self.generation),
            issued: self.generation.load(Ordering::SeqCst),
        };
        let period = self.config.interval;
        let start = if self.config.fire_immediately {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let name = self.name;
        debug!(poller = name, ?period, "Starting poller");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !token.is_live() {
                    debug!(poller = name, "Poller generation changed, exiting");
                    break;
                }
                tokio::spawn(tick(token.clone()));
            }
        });

        if let Ok(mut task) = self.task.lock() {
            *task = Some(handle);
        }
    }

    /// Stop the current cycle. Queued tick bodies see a dead token.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let previous = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = previous {
            handle.abort();
            debug!(poller = self.name, "Poller stopped");
        }
    }

    /// Whether a cycle is currently scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for poller configuration.
#[derive(Debug, Clone, Default)]
pub struct PollConfigBuilder {
    interval: Option<Duration>,
    enabled: Option<bool>,
    fire_immediately: Option<bool>,
}

impl PollConfigBuilder {
    /// Create a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the interval between ticks.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Enable or disable the poller.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Fire the first tick immediately.
    #[must_use]
    pub const fn fire_immediately(mut self, fire: bool) -> Self {
        self.fire_immediately = Some(fire);
        self
    }

    /// Build the poller configuration.
    #[must_use]
    pub fn build(self) -> PollConfig {
        let default = PollConfig::default();
        PollConfig {
            interval: self.interval.unwrap_or(default.interval),
            enabled: self.enabled.unwrap_or(default.enabled),
            fire_immediately: self.fire_immediately.unwrap_or(default.fire_immediately),
        }
    }
}
