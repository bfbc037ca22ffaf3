//! # Chemotaxis Core
//!
//! The world state engine for a chemotaxis simulation: single-cell organisms
//! steer through overlapping chemical gradients toward their preferred
//! concentration, feed, reproduce with mutation and starve.
//!
//! This crate contains the deterministic simulation logic, including:
//! - Static superposition of chemical sources with a lazily cached grid
//! - The system energy ledger (depletion, consumption, regeneration)
//! - Organism sensing, greedy steering, movement and metabolism
//! - A thread-safe world coordinator and a fixed-step simulation loop
//! - Metrics collection and structured logging
//!
//! ## Example
//!
//! ```
//! use chemotaxis_core::config::AppConfig;
//! use chemotaxis_core::simulation::Simulator;
//!
//! let mut config = AppConfig::default();
//! config.organism.count = 10;
//! let sim = Simulator::new(config).unwrap();
//!
//! let report = sim.step().unwrap().expect("not paused");
//! assert_eq!(report.organisms, sim.world().organism_count());
//! ```

/// Organism sensing, steering, movement, energy and reproduction
pub mod behavior;
/// Configuration management for simulation parameters
pub mod config;
/// Concentration fields and the cached grid
pub mod field;
/// System-wide source energy accounting
pub mod ledger;
/// Initial population
pub mod lifecycle;
/// Performance metrics collection and logging
pub mod metrics;
/// Trait mutation for offspring
pub mod mutation;
/// Fixed-step simulation driver
pub mod simulation;
/// Chemical source emission and depletion
pub mod source;
/// Population and field statistics
pub mod stats;
/// Thread-safe world coordinator
pub mod world;

pub use config::AppConfig;
pub use field::{ChemicalField, ConcentrationField};
pub use ledger::{EnergyLedger, EnergySink};
pub use metrics::{init_logging, Metrics};
pub use simulation::Simulator;
pub use source::SourceLogic;
pub use stats::WorldStats;
pub use world::{StepReport, WorldCoordinator, WorldHandle};
