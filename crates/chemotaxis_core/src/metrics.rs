//! Performance metrics collection for the simulation.
//!
//! Provides structured logging and metrics tracking for monitoring
//! simulation performance and health.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Step counters shared between the simulation thread and observers.
#[derive(Debug)]
pub struct Metrics {
    step_count: AtomicU64,
    organism_count: AtomicU64,
    active_source_count: AtomicU64,
    births: AtomicU64,
    deaths: AtomicU64,
    counters: Mutex<HashMap<String, u64>>,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            step_count: AtomicU64::new(0),
            organism_count: AtomicU64::new(0),
            active_source_count: AtomicU64::new(0),
            births: AtomicU64::new(0),
            deaths: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Records a completed step. Logs a summary every `log_interval` steps.
    pub fn record_step(
        &self,
        duration: Duration,
        organisms: usize,
        active_sources: usize,
        log_interval: u64,
    ) {
        let step = self.step_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.organism_count.store(organisms as u64, Ordering::Relaxed);
        self.active_source_count
            .store(active_sources as u64, Ordering::Relaxed);

        if log_interval > 0 && step % log_interval == 0 {
            tracing::info!(
                step,
                organisms,
                active_sources,
                births = self.births(),
                deaths = self.deaths(),
                duration_us = duration.as_micros() as u64,
                "Simulation step"
            );
        }
    }

    pub fn record_births(&self, count: usize) {
        self.births.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_deaths(&self, count: usize) {
        self.deaths.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Increments a named counter.
    pub fn increment_counter(&self, name: &str) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn organism_count(&self) -> u64 {
        self.organism_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn active_source_count(&self) -> u64 {
        self.active_source_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn births(&self) -> u64 {
        self.births.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn deaths(&self) -> u64 {
        self.deaths.load(Ordering::Relaxed)
    }

    /// Gets elapsed time since metrics creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Zeroes every counter; used when the world is reset.
    pub fn reset(&self) {
        self.step_count.store(0, Ordering::Relaxed);
        self.organism_count.store(0, Ordering::Relaxed);
        self.active_source_count.store(0, Ordering::Relaxed);
        self.births.store(0, Ordering::Relaxed);
        self.deaths.store(0, Ordering::Relaxed);
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Installs a global fmt subscriber filtered by `RUST_LOG`, falling back
/// to `default_filter`. Returns `false` if a subscriber was already set.
pub fn init_logging(default_filter: &str) -> bool {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init()
        .is_ok()
}
