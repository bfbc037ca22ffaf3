//! Configuration management for simulation parameters.
//!
//! This module provides strongly-typed configuration structures that map to
//! a `config.toml` (or JSON) file. Every section has a complete `Default`, so
//! a file only needs to override the values it cares about.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! width = 400.0
//! height = 300.0
//! seed = 42
//!
//! [chemical]
//! count = 20
//! consumption_multiplier = 2.0
//!
//! [reproduction]
//! max_population = 1000
//! ```

use serde::{Deserialize, Serialize};

/// World dimensions and the random seed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f64,
    pub height: f64,
    /// `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 400.0,
            height: 300.0,
            seed: Some(42),
        }
    }
}

/// Initial population and steering parameters.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OrganismConfig {
    pub count: usize,
    /// World units per second.
    pub speed: f64,
    pub sensor_distance: f64,
    /// Offset of the left/right sensors from the heading (radians).
    pub sensor_angle: f64,
    /// Maximum heading change in radians per second.
    pub turn_speed: f64,
    pub preference_mean: f64,
    pub preference_stddev: f64,
    pub preference_min: f64,
    /// Organisms are placed at least this far from the walls.
    pub spawn_margin: f64,
}

impl Default for OrganismConfig {
    fn default() -> Self {
        Self {
            count: 100,
            speed: 20.0,
            sensor_distance: 10.0,
            sensor_angle: std::f64::consts::FRAC_PI_4,
            turn_speed: 3.0,
            preference_mean: 40.0,
            preference_stddev: 15.0,
            preference_min: 1.0,
            spawn_margin: 5.0,
        }
    }
}

/// Chemical sources and the energy ledger policy.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ChemicalConfig {
    /// Sources created at population time; also the regeneration target count.
    pub count: usize,
    pub strength_min: f64,
    pub strength_max: f64,
    pub decay_min: f64,
    pub decay_max: f64,
    /// Passive energy loss per source per second.
    pub depletion_rate: f64,
    pub source_max_energy: f64,
    /// Regeneration events per second; the per-step chance is
    /// `regeneration_probability * dt`, capped at 1.
    pub regeneration_probability: f64,
    pub target_system_energy: f64,
    /// Source energy removed per unit of energy an organism gains.
    pub consumption_multiplier: f64,
}

impl Default for ChemicalConfig {
    fn default() -> Self {
        Self {
            count: 20,
            strength_min: 50.0,
            strength_max: 150.0,
            decay_min: 0.001,
            decay_max: 0.005,
            depletion_rate: 2.0,
            source_max_energy: 2500.0,
            regeneration_probability: 4.0,
            target_system_energy: 50_000.0,
            consumption_multiplier: 2.0,
        }
    }
}

/// Organism energy budget.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EnergyConfig {
    pub initial_energy: f64,
    pub max_energy: f64,
    pub metabolic_rate: f64,
    pub movement_cost: f64,
    pub sensing_cost: f64,
    pub optimal_gain_rate: f64,
    pub efficiency_min: f64,
    pub efficiency_max: f64,
    /// Preference similarity above which feeding starts.
    pub gain_similarity_threshold: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            initial_energy: 60.0,
            max_energy: 100.0,
            metabolic_rate: 0.5,
            movement_cost: 0.01,
            sensing_cost: 0.02,
            optimal_gain_rate: 3.0,
            efficiency_min: 0.8,
            efficiency_max: 1.2,
            gain_similarity_threshold: 0.7,
        }
    }
}

/// Reproduction gate and mutation magnitudes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReproductionConfig {
    /// Fraction of capacity required to reproduce.
    pub threshold: f64,
    /// Seconds between reproductions.
    pub cooldown: f64,
    /// Fraction of parent energy handed to the offspring.
    pub offspring_ratio: f64,
    pub spawn_distance_min: f64,
    pub spawn_distance_max: f64,
    pub preference_mutation: f64,
    pub cost_mutation: f64,
    pub speed_mutation: f64,
    pub gain_mutation: f64,
    pub sensor_mutation: f64,
    pub max_population: usize,
}

impl Default for ReproductionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.75,
            cooldown: 5.0,
            offspring_ratio: 0.3,
            spawn_distance_min: 5.0,
            spawn_distance_max: 10.0,
            preference_mutation: 0.05,
            cost_mutation: 0.05,
            speed_mutation: 0.1,
            gain_mutation: 0.1,
            sensor_mutation: 0.05,
            max_population: 1000,
        }
    }
}

/// Fixed time step and speed multiplier range.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated seconds per step at speed 1.0.
    pub time_step: f64,
    pub default_speed: f64,
    pub min_speed: f64,
    pub max_speed: f64,
    /// Steps between periodic metric log lines.
    pub log_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.05,
            default_speed: 1.0,
            min_speed: 0.1,
            max_speed: 10.0,
            log_interval: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FieldMode {
    /// Sum every active source on each lookup.
    Direct,
    /// Interpolate a lazily rebuilt concentration grid.
    #[default]
    Grid,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    pub mode: FieldMode,
    pub grid_cell_size: f64,
    /// Relative source energy change that invalidates the grid.
    pub invalidation_threshold: f64,
    /// Samples per axis used by statistics.
    pub stats_sample_resolution: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            mode: FieldMode::Grid,
            grid_cell_size: 5.0,
            invalidation_threshold: 0.05,
            stats_sample_resolution: 20,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub organism: OrganismConfig,
    pub chemical: ChemicalConfig,
    pub energy: EnergyConfig,
    pub reproduction: ReproductionConfig,
    pub simulation: SimulationConfig,
    pub field: FieldConfig,
}

impl AppConfig {
    /// Validates all configuration parameters.
    ///
    /// Returns `Ok(())` if all parameters are valid, or `Err` with a description
    /// of the first validation failure.
    pub fn validate(&self) -> anyhow::Result<()> {
        // World validation
        anyhow::ensure!(
            self.world.width > 0.0 && self.world.width.is_finite(),
            "World width must be positive"
        );
        anyhow::ensure!(
            self.world.height > 0.0 && self.world.height.is_finite(),
            "World height must be positive"
        );
        anyhow::ensure!(
            self.world.width <= 100_000.0 && self.world.height <= 100_000.0,
            "World dimensions too large (max 100000)"
        );

        // Organism validation
        let o = &self.organism;
        anyhow::ensure!(o.speed >= 0.0, "Organism speed must be non-negative");
        anyhow::ensure!(
            o.sensor_distance > 0.0,
            "Sensor distance must be positive"
        );
        anyhow::ensure!(o.turn_speed >= 0.0, "Turn speed must be non-negative");
        anyhow::ensure!(
            o.preference_stddev >= 0.0,
            "Preference stddev must be non-negative"
        );
        anyhow::ensure!(
            o.preference_min > 0.0,
            "Preference minimum must be positive"
        );
        anyhow::ensure!(
            o.spawn_margin >= 0.0
                && o.spawn_margin * 2.0 < self.world.width
                && o.spawn_margin * 2.0 < self.world.height,
            "Spawn margin must fit inside the world"
        );
        anyhow::ensure!(
            o.count <= self.reproduction.max_population,
            "Initial organism count exceeds max population"
        );

        // Chemical validation
        let c = &self.chemical;
        anyhow::ensure!(
            c.strength_min >= 0.0 && c.strength_min <= c.strength_max,
            "Strength range must satisfy 0 <= min <= max"
        );
        anyhow::ensure!(
            c.decay_min >= 0.0 && c.decay_min <= c.decay_max,
            "Decay range must satisfy 0 <= min <= max"
        );
        anyhow::ensure!(
            c.depletion_rate >= 0.0,
            "Depletion rate must be non-negative"
        );
        anyhow::ensure!(
            c.source_max_energy > 0.0,
            "Source max energy must be positive"
        );
        anyhow::ensure!(
            c.regeneration_probability >= 0.0,
            "Regeneration probability must be non-negative"
        );
        anyhow::ensure!(
            c.target_system_energy >= 0.0,
            "Target system energy must be non-negative"
        );
        anyhow::ensure!(
            c.consumption_multiplier >= 0.0,
            "Consumption multiplier must be non-negative"
        );

        // Energy validation
        let e = &self.energy;
        anyhow::ensure!(e.max_energy > 0.0, "Max energy must be positive");
        anyhow::ensure!(
            e.initial_energy > 0.0 && e.initial_energy <= e.max_energy,
            "Initial energy must be in (0, max_energy]"
        );
        anyhow::ensure!(
            e.metabolic_rate >= 0.0 && e.movement_cost >= 0.0 && e.sensing_cost >= 0.0,
            "Energy costs must be non-negative"
        );
        anyhow::ensure!(
            e.optimal_gain_rate >= 0.0,
            "Optimal gain rate must be non-negative"
        );
        anyhow::ensure!(
            e.efficiency_min > 0.0 && e.efficiency_min <= e.efficiency_max,
            "Efficiency range must satisfy 0 < min <= max"
        );
        anyhow::ensure!(
            e.gain_similarity_threshold >= 0.0 && e.gain_similarity_threshold < 1.0,
            "Gain similarity threshold must be in [0.0, 1.0)"
        );

        // Reproduction validation
        let r = &self.reproduction;
        anyhow::ensure!(
            r.threshold > 0.0 && r.threshold <= 1.0,
            "Reproduction threshold must be in (0.0, 1.0]"
        );
        anyhow::ensure!(r.cooldown >= 0.0, "Cooldown must be non-negative");
        anyhow::ensure!(
            r.offspring_ratio > 0.0 && r.offspring_ratio < 1.0,
            "Offspring ratio must be in (0.0, 1.0)"
        );
        anyhow::ensure!(
            r.spawn_distance_min >= 0.0 && r.spawn_distance_min <= r.spawn_distance_max,
            "Spawn distance range must satisfy 0 <= min <= max"
        );
        anyhow::ensure!(
            [
                r.preference_mutation,
                r.cost_mutation,
                r.speed_mutation,
                r.gain_mutation,
                r.sensor_mutation
            ]
            .iter()
            .all(|m| *m >= 0.0 && *m <= 1.0),
            "Mutation magnitudes must be in [0.0, 1.0]"
        );

        // Simulation validation
        let s = &self.simulation;
        anyhow::ensure!(s.time_step > 0.0, "Time step must be positive");
        anyhow::ensure!(
            s.min_speed > 0.0 && s.min_speed <= s.max_speed,
            "Speed range must satisfy 0 < min <= max"
        );
        anyhow::ensure!(
            s.default_speed >= s.min_speed && s.default_speed <= s.max_speed,
            "Default speed must lie inside the speed range"
        );

        // Field validation
        anyhow::ensure!(
            self.field.grid_cell_size > 0.0,
            "Grid cell size must be positive"
        );
        anyhow::ensure!(
            self.field.invalidation_threshold >= 0.0,
            "Invalidation threshold must be non-negative"
        );
        anyhow::ensure!(
            self.field.stats_sample_resolution >= 2,
            "Stats sample resolution must be at least 2"
        );

        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stable hash of every simulation-affecting section.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.world).as_bytes());
        hasher.update(format!("{:?}", self.organism).as_bytes());
        hasher.update(format!("{:?}", self.chemical).as_bytes());
        hasher.update(format!("{:?}", self.energy).as_bytes());
        hasher.update(format!("{:?}", self.reproduction).as_bytes());
        hasher.update(format!("{:?}", self.simulation).as_bytes());
        hasher.update(format!("{:?}", self.field).as_bytes());
        hex::encode(hasher.finalize())
    }
}
