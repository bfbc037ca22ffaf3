//! Headless chemotaxis simulation.
//!
//! Re-exports the engine, data and I/O crates and adds [`runner`], the
//! batch driver used by the `chemotaxis` binary.

pub mod runner;

pub use chemotaxis_core;
pub use chemotaxis_data;
pub use chemotaxis_io;

pub use chemotaxis_core::{AppConfig, Simulator, StepReport, WorldCoordinator, WorldStats};
pub use runner::{run, RunOptions, RunSummary};
