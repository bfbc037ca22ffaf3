//! Plain data types shared across the chemotaxis workspace.
//!
//! Nothing in this crate knows about fields, ledgers or locks; simulation
//! logic lives in `chemotaxis_core` as extension traits and free functions.

pub mod data;

pub use data::chemical::ChemicalSource;
pub use data::geometry::{Point, Rect};
pub use data::organism::{MetabolicTraits, Organism, SensorAngles};
