//! Fixed-step driver with pause and speed control.

use crate::config::{AppConfig, SimulationConfig};
use crate::stats::{self, WorldStats};
use crate::world::{StepReport, WorldCoordinator, WorldHandle};
use atomic_float::AtomicF64;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Advances a shared world one fixed time step per [`Simulator::step`].
///
/// Pause state, speed and the clock are atomics so a render thread can
/// read them without touching the world locks.
#[derive(Debug)]
pub struct Simulator {
    world: WorldHandle,
    time: AtomicF64,
    speed: AtomicF64,
    paused: AtomicBool,
    steps: AtomicU64,
    settings: RwLock<SimulationConfig>,
}

impl Simulator {
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        Ok(Self::with_world(WorldCoordinator::new(config)?.into_handle()))
    }

    #[must_use]
    pub fn with_world(world: WorldHandle) -> Self {
        let settings = world.config().simulation;
        Self {
            world,
            time: AtomicF64::new(0.0),
            speed: AtomicF64::new(settings.default_speed),
            paused: AtomicBool::new(false),
            steps: AtomicU64::new(0),
            settings: RwLock::new(settings),
        }
    }

    /// Shared handle to the world being driven.
    #[must_use]
    pub fn world(&self) -> WorldHandle {
        Arc::clone(&self.world)
    }

    /// Simulated seconds since the last reset.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.time.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.steps.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        if self.paused.swap(paused, Ordering::Relaxed) != paused {
            tracing::info!(paused, time = self.time(), "Simulation pause toggled");
        }
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed.load(Ordering::Relaxed)
    }

    /// Clamps `speed` into the configured range and applies it. Returns
    /// the speed now in effect; NaN leaves it unchanged.
    pub fn set_simulation_speed(&self, speed: f64) -> f64 {
        if speed.is_nan() {
            return self.speed();
        }
        let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
        let clamped = speed.clamp(settings.min_speed, settings.max_speed);
        self.speed.store(clamped, Ordering::Relaxed);
        tracing::debug!(requested = speed, applied = clamped, "Simulation speed set");
        clamped
    }

    /// `time_step * speed`.
    #[must_use]
    pub fn effective_time_step(&self) -> f64 {
        let base = self
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .time_step;
        base * self.speed()
    }

    /// Advances the world by one step unless paused.
    ///
    /// Returns `Ok(None)` while paused.
    pub fn step(&self) -> anyhow::Result<Option<StepReport>> {
        if self.is_paused() {
            return Ok(None);
        }
        let dt = self.effective_time_step();
        let report = self.world.advance(dt)?;
        self.time.fetch_add(dt, Ordering::Relaxed);
        self.steps.fetch_add(1, Ordering::Relaxed);
        Ok(Some(report))
    }

    /// Repopulates from the current configuration.
    pub fn reset(&self) -> anyhow::Result<()> {
        self.reset_with(self.world.config())
    }

    /// Repopulates from `config` and returns to running at time 0 with the
    /// default speed.
    pub fn reset_with(&self, config: AppConfig) -> anyhow::Result<()> {
        let settings = config.simulation.clone();
        self.world.reset(config)?;
        self.speed.store(settings.default_speed, Ordering::Relaxed);
        *self.settings.write().unwrap_or_else(PoisonError::into_inner) = settings;
        self.time.store(0.0, Ordering::Relaxed);
        self.steps.store(0, Ordering::Relaxed);
        self.paused.store(false, Ordering::Relaxed);
        tracing::info!("Simulation reset");
        Ok(())
    }

    /// Statistics snapshot at the current simulated time.
    #[must_use]
    pub fn collect_stats(&self) -> WorldStats {
        let resolution = self.world.config().field.stats_sample_resolution;
        stats::collect(&self.world, self.time(), resolution)
    }
}
