//! Core data structures for the chemotaxis simulation.

pub mod chemical;
pub mod geometry;
pub mod organism;
