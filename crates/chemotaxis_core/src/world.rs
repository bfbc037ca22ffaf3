//! The authoritative world: organisms, chemical sources, the field cache
//! and the energy ledger behind per-collection locks.
//!
//! Lock order, for every method that takes more than one:
//! `step_lock -> config -> chemistry -> organisms -> field -> rng`.

use crate::behavior::{self, BehaviorParams};
use crate::config::AppConfig;
use crate::field::{ChemicalField, ConcentrationField};
use crate::ledger::{EnergyLedger, EnergySink, LedgerUpdate, Regeneration};
use crate::lifecycle;
use crate::metrics::Metrics;
use chemotaxis_data::{ChemicalSource, Organism, Point, Rect};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::Instant;

/// Tolerance used by the post-step invariant audit.
const ENERGY_TOLERANCE: f64 = 1e-6;

/// Called with the position of every offspring.
pub type ReproductionCallback = Box<dyn Fn(Point) + Send + Sync>;

/// Shared ownership of a world between the simulation and observer threads.
pub type WorldHandle = Arc<WorldCoordinator>;

/// What one call to [`WorldCoordinator::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StepReport {
    pub dt: f64,
    pub births: usize,
    pub deaths: usize,
    /// Organisms dropped by the commit because they left the world.
    pub rejected: usize,
    pub organisms: usize,
    pub active_sources: usize,
    pub total_energy: f64,
    pub target_energy: f64,
    pub energy_drawn: f64,
    pub regenerated: bool,
}

#[derive(Debug)]
struct Chemistry {
    sources: Vec<ChemicalSource>,
    ledger: EnergyLedger,
}

/// Field reads and feeding for one step, over locked chemistry.
struct StepEnvironment<'a> {
    sources: &'a mut [ChemicalSource],
    ledger: &'a mut EnergyLedger,
    field: &'a ChemicalField,
}

impl ConcentrationField for StepEnvironment<'_> {
    fn concentration_at(&self, p: Point) -> f64 {
        self.field.concentration_at(&*self.sources, p)
    }
}

impl EnergySink for StepEnvironment<'_> {
    fn deplete(&mut self, position: Point, amount: f64) -> f64 {
        let removed = self.ledger.deplete(&mut *self.sources, position, amount);
        if removed > 0.0 {
            self.field.sync(&*self.sources);
        }
        removed
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn retain_in_bounds(mut organisms: Vec<Organism>, bounds: Rect) -> (Vec<Organism>, usize) {
    let before = organisms.len();
    organisms.retain(|o| bounds.contains(o.position));
    let rejected = before - organisms.len();
    if rejected > 0 {
        tracing::warn!(rejected, "Dropped out-of-bounds organisms on commit");
    }
    (organisms, rejected)
}

fn seeded_rng(config: &AppConfig) -> ChaCha8Rng {
    match config.world.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

pub struct WorldCoordinator {
    config: RwLock<AppConfig>,
    chemistry: RwLock<Chemistry>,
    organisms: RwLock<Vec<Organism>>,
    field: ChemicalField,
    rng: Mutex<ChaCha8Rng>,
    next_id: AtomicU64,
    step_lock: Mutex<()>,
    on_reproduction: RwLock<Option<ReproductionCallback>>,
    metrics: Metrics,
}

impl std::fmt::Debug for WorldCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldCoordinator")
            .field("bounds", &self.bounds())
            .field("organisms", &self.organism_count())
            .field("sources", &self.source_count())
            .finish_non_exhaustive()
    }
}

impl WorldCoordinator {
    /// Validates `config` and populates a fresh world from its seed.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let bounds = Rect::new(config.world.width, config.world.height);
        let mut rng = seeded_rng(&config);
        let population = lifecycle::populate(&config, &mut rng);
        let ledger = EnergyLedger::new(&config.chemical, bounds, &population.sources);
        let next_id = population.organisms.len() as u64 + 1;

        tracing::info!(
            organisms = population.organisms.len(),
            sources = population.sources.len(),
            total_energy = ledger.total(),
            fingerprint = %config.fingerprint(),
            "World populated"
        );

        Ok(Self {
            field: ChemicalField::new(bounds, &config.field),
            chemistry: RwLock::new(Chemistry {
                sources: population.sources,
                ledger,
            }),
            organisms: RwLock::new(population.organisms),
            rng: Mutex::new(rng),
            next_id: AtomicU64::new(next_id),
            step_lock: Mutex::new(()),
            on_reproduction: RwLock::new(None),
            metrics: Metrics::new(),
            config: RwLock::new(config),
        })
    }

    /// Wraps the world in a shareable handle.
    #[must_use]
    pub fn into_handle(self) -> WorldHandle {
        Arc::new(self)
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        let config = read(&self.config);
        Rect::new(config.world.width, config.world.height)
    }

    #[must_use]
    pub fn config(&self) -> AppConfig {
        read(&self.config).clone()
    }

    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    // ---- snapshots ----

    /// Copy of every organism.
    #[must_use]
    pub fn organisms(&self) -> Vec<Organism> {
        read(&self.organisms).clone()
    }

    /// Copy of every chemical source, active or not.
    #[must_use]
    pub fn chemical_sources(&self) -> Vec<ChemicalSource> {
        read(&self.chemistry).sources.clone()
    }

    #[must_use]
    pub fn organism_count(&self) -> usize {
        read(&self.organisms).len()
    }

    #[must_use]
    pub fn source_count(&self) -> usize {
        read(&self.chemistry).sources.len()
    }

    #[must_use]
    pub fn active_source_count(&self) -> usize {
        read(&self.chemistry).sources.iter().filter(|s| s.active).count()
    }

    /// `(total, target)` source energy.
    #[must_use]
    pub fn system_energy_info(&self) -> (f64, f64) {
        read(&self.chemistry).ledger.system_energy_info()
    }

    /// Number of times the cached grid has been built.
    #[must_use]
    pub fn field_rebuilds(&self) -> u64 {
        self.field.rebuild_count()
    }

    // ---- field queries ----

    #[must_use]
    pub fn concentration_at(&self, p: Point) -> f64 {
        let chemistry = read(&self.chemistry);
        self.field.concentration_at(&chemistry.sources, p)
    }

    #[must_use]
    pub fn gradient_at(&self, p: Point) -> Point {
        let chemistry = read(&self.chemistry);
        self.field.view(&chemistry.sources).gradient_at(p)
    }

    /// Concentrations at many points against one consistent source state.
    #[must_use]
    pub fn concentrations_at(&self, points: &[Point]) -> Vec<f64> {
        let chemistry = read(&self.chemistry);
        let view = self.field.view(&chemistry.sources);
        #[cfg(feature = "parallel")]
        {
            points.par_iter().map(|p| view.concentration_at(*p)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            points.iter().map(|p| view.concentration_at(*p)).collect()
        }
    }

    // ---- mutators ----

    /// Adds an organism. Returns `false`, leaving the world unchanged, when
    /// its position lies outside the world.
    ///
    /// An id of 0, or one already held by an organism in the world, is
    /// replaced with a fresh one.
    pub fn add_organism(&self, mut organism: Organism) -> bool {
        if !self.bounds().contains(organism.position) {
            tracing::warn!(
                x = organism.position.x,
                y = organism.position.y,
                "Rejected organism outside world bounds"
            );
            return false;
        }
        organism.energy = organism.energy.clamp(0.0, organism.energy_capacity.max(0.0));

        let mut organisms = write(&self.organisms);
        let taken = organism.id != 0 && organisms.iter().any(|o| o.id == organism.id);
        if organism.id == 0 || taken {
            let fresh = self.next_id.fetch_add(1, Ordering::Relaxed);
            if taken {
                tracing::debug!(requested = organism.id, assigned = fresh, "Organism id taken");
            }
            organism.id = fresh;
        } else {
            self.next_id
                .fetch_max(organism.id.saturating_add(1), Ordering::Relaxed);
        }
        organisms.push(organism);
        true
    }

    /// Adds a source and credits its energy to the ledger. Returns `false`
    /// when its position lies outside the world.
    pub fn add_chemical_source(&self, mut source: ChemicalSource) -> bool {
        if !self.bounds().contains(source.position) {
            tracing::warn!(
                x = source.position.x,
                y = source.position.y,
                "Rejected chemical source outside world bounds"
            );
            return false;
        }
        source.max_energy = source.max_energy.max(0.0);
        source.energy = source.energy.clamp(0.0, source.max_energy);
        source.active = source.energy > 0.0;
        let mut chemistry = write(&self.chemistry);
        let Chemistry { sources, ledger } = &mut *chemistry;
        ledger.register_source(sources, source);
        self.field.sync(sources);
        true
    }

    /// Replaces the organism set, dropping entries outside the world.
    /// Returns the number dropped.
    pub fn update_organisms(&self, organisms: Vec<Organism>) -> usize {
        let (kept, rejected) = retain_in_bounds(organisms, self.bounds());
        *write(&self.organisms) = kept;
        rejected
    }

    /// Commits a ticked snapshot. Organisms added after the snapshot was
    /// taken are carried over untouched.
    fn commit(&self, mut ticked: Vec<Organism>, snapshot_ids: &HashSet<u64>) -> usize {
        let bounds = self.bounds();
        let mut organisms = write(&self.organisms);
        ticked.extend(
            organisms
                .iter()
                .filter(|o| !snapshot_ids.contains(&o.id))
                .cloned(),
        );
        let (kept, rejected) = retain_in_bounds(ticked, bounds);
        *organisms = kept;
        rejected
    }

    /// Removes organisms marked for removal. Returns how many were removed.
    pub fn remove_dead_organisms(&self) -> usize {
        let mut organisms = write(&self.organisms);
        let before = organisms.len();
        organisms.retain(Organism::is_alive);
        let removed = before - organisms.len();
        drop(organisms);
        self.metrics.record_deaths(removed);
        removed
    }

    /// Lets every eligible organism reproduce while the population stays
    /// below `max_population`. Returns the number of offspring.
    ///
    /// The reproduction callback, if any, is invoked for each offspring
    /// after the organism lock is released.
    pub fn process_reproduction(&self, max_population: usize) -> usize {
        let params = BehaviorParams::from_config(&read(&self.config));
        let mut offspring = Vec::new();
        {
            let mut organisms = write(&self.organisms);
            let mut rng = lock(&self.rng);
            let existing = organisms.len();
            for parent in organisms.iter_mut() {
                if existing + offspring.len() >= max_population {
                    break;
                }
                if behavior::can_reproduce(parent, &params) {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    offspring.push(behavior::reproduce(parent, id, &params, &mut *rng));
                }
            }
            organisms.extend(offspring.iter().cloned());
        }

        if !offspring.is_empty() {
            tracing::debug!(births = offspring.len(), "Organisms reproduced");
            self.metrics.record_births(offspring.len());
            if let Some(callback) = read(&self.on_reproduction).as_ref() {
                for child in &offspring {
                    callback(child.position);
                }
            }
        }
        offspring.len()
    }

    /// Passive depletion and regeneration over `dt`.
    ///
    /// The grid cache is settled on both sides of the update, so its basis
    /// never depends on whether a reader happened to build it first.
    pub fn update_chemical_sources(&self, dt: f64) -> LedgerUpdate {
        let mut chemistry = write(&self.chemistry);
        let Chemistry { sources, ledger } = &mut *chemistry;
        self.field.refresh(sources);
        let update = {
            let mut rng = lock(&self.rng);
            ledger.update_sources(sources, dt, &mut *rng)
        };
        self.field.refresh(sources);

        if update.deactivated > 0 {
            tracing::debug!(count = update.deactivated, "Chemical sources depleted");
        }
        match update.regeneration {
            Some(Regeneration::Reactivated { index, energy }) => {
                tracing::debug!(index, energy, "Chemical source reactivated");
                self.metrics.increment_counter("sources_reactivated");
            }
            Some(Regeneration::Created { index, energy }) => {
                tracing::debug!(index, energy, "Chemical source regenerated");
                self.metrics.increment_counter("sources_created");
            }
            Some(Regeneration::Recharged { sources, energy }) => {
                tracing::trace!(sources, energy, "Chemical sources topped up");
                self.metrics.increment_counter("sources_recharged");
            }
            None => {}
        }
        update
    }

    /// Resynchronises the ledger total with the sources; returns the drift.
    pub fn recompute_energy_total(&self) -> f64 {
        let mut chemistry = write(&self.chemistry);
        let Chemistry { sources, ledger } = &mut *chemistry;
        ledger.recompute_total(sources)
    }

    pub fn set_reproduction_callback<F>(&self, callback: F)
    where
        F: Fn(Point) + Send + Sync + 'static,
    {
        *write(&self.on_reproduction) = Some(Box::new(callback));
    }

    pub fn clear_reproduction_callback(&self) {
        *write(&self.on_reproduction) = None;
    }

    /// Repopulates the world from `config`. The reproduction callback is
    /// kept.
    pub fn reset(&self, config: AppConfig) -> anyhow::Result<()> {
        config.validate()?;
        let _step = lock(&self.step_lock);
        let bounds = Rect::new(config.world.width, config.world.height);
        let mut rng = seeded_rng(&config);
        let population = lifecycle::populate(&config, &mut rng);

        let mut config_guard = write(&self.config);
        let mut chemistry = write(&self.chemistry);
        let mut organisms = write(&self.organisms);

        chemistry.ledger = EnergyLedger::new(&config.chemical, bounds, &population.sources);
        chemistry.sources = population.sources;
        *organisms = population.organisms;
        self.field.reconfigure(bounds, &config.field);
        *lock(&self.rng) = rng;
        self.next_id
            .store(organisms.len() as u64 + 1, Ordering::Relaxed);
        self.metrics.reset();

        tracing::info!(
            organisms = organisms.len(),
            sources = chemistry.sources.len(),
            fingerprint = %config.fingerprint(),
            "World reset"
        );
        *config_guard = config;
        Ok(())
    }

    /// Runs one full step of length `dt`.
    ///
    /// Order: source depletion and regeneration, organism behaviour,
    /// commit, death, reproduction, invariant audit.
    pub fn advance(&self, dt: f64) -> anyhow::Result<StepReport> {
        anyhow::ensure!(dt.is_finite() && dt > 0.0, "Step length must be positive, got {dt}");
        let _step = self
            .step_lock
            .lock()
            .map_err(|_| anyhow::anyhow!("A previous step panicked; world state is suspect"))?;
        anyhow::ensure!(
            !self.organisms.is_poisoned() && !self.chemistry.is_poisoned(),
            "World lock poisoned"
        );
        let started = Instant::now();

        let (params, max_population, log_interval) = {
            let config = read(&self.config);
            (
                BehaviorParams::from_config(&config),
                config.reproduction.max_population,
                config.simulation.log_interval,
            )
        };

        let ledger_update = self.update_chemical_sources(dt);

        let mut working = self.organisms();
        let snapshot_ids: HashSet<u64> = working.iter().map(|o| o.id).collect();
        let mut energy_drawn = 0.0;
        {
            // Held for the whole behaviour pass: readers only ever see
            // source state from a step boundary, and grid builds happen at
            // points fixed by the step sequence alone.
            let mut chemistry = write(&self.chemistry);
            let Chemistry { sources, ledger } = &mut *chemistry;
            let mut env = StepEnvironment {
                sources,
                ledger,
                field: &self.field,
            };
            for organism in &mut working {
                energy_drawn += behavior::tick(organism, &mut env, &params, dt).drawn;
            }
            self.field.refresh(sources);
        }

        let rejected = self.commit(working, &snapshot_ids);
        let deaths = self.remove_dead_organisms();
        let births = self.process_reproduction(max_population);

        self.check_invariants()?;

        let (total_energy, target_energy) = self.system_energy_info();
        let report = StepReport {
            dt,
            births,
            deaths,
            rejected,
            organisms: self.organism_count(),
            active_sources: self.active_source_count(),
            total_energy,
            target_energy,
            energy_drawn,
            regenerated: ledger_update.regeneration.is_some(),
        };
        self.metrics.record_step(
            started.elapsed(),
            report.organisms,
            report.active_sources,
            log_interval,
        );
        tracing::trace!(?report, "Step complete");
        Ok(report)
    }

    /// Audits organism and source state after a step.
    pub fn check_invariants(&self) -> anyhow::Result<()> {
        let bounds = self.bounds();
        {
            let chemistry = read(&self.chemistry);
            for (i, s) in chemistry.sources.iter().enumerate() {
                anyhow::ensure!(
                    s.energy.is_finite()
                        && s.energy >= 0.0
                        && s.energy <= s.max_energy + ENERGY_TOLERANCE,
                    "Source {i} energy {} outside [0, {}]",
                    s.energy,
                    s.max_energy
                );
                anyhow::ensure!(
                    s.active == (s.energy > 0.0),
                    "Source {i} active flag disagrees with energy {}",
                    s.energy
                );
            }
            let total = chemistry.ledger.total();
            anyhow::ensure!(
                total.is_finite() && total >= 0.0,
                "System energy total is {total}"
            );
        }

        let organisms = read(&self.organisms);
        for o in organisms.iter() {
            anyhow::ensure!(
                o.energy.is_finite()
                    && o.energy >= 0.0
                    && o.energy <= o.energy_capacity + ENERGY_TOLERANCE,
                "Organism {} energy {} outside [0, {}]",
                o.id,
                o.energy,
                o.energy_capacity
            );
            anyhow::ensure!(
                bounds.contains(o.position),
                "Organism {} left the world at ({}, {})",
                o.id,
                o.position.x,
                o.position.y
            );
            anyhow::ensure!(
                o.heading.is_finite() && o.chem_preference.is_finite(),
                "Organism {} has non-finite heading or preference",
                o.id
            );
        }
        Ok(())
    }
}
