use super::geometry::Point;
use serde::{Deserialize, Serialize};

/// A point emitter of chemical concentration with its own energy budget.
///
/// `active` mirrors `energy > 0`; a source is deactivated when drained and
/// kept in the world so regeneration can bring it back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChemicalSource {
    pub position: Point,
    /// Peak concentration at the source position when fully charged.
    pub strength: f64,
    /// Spatial falloff applied to the squared distance.
    pub decay_factor: f64,
    pub energy: f64,
    pub max_energy: f64,
    /// Passive energy loss per second.
    pub depletion_rate: f64,
    pub active: bool,
}

impl ChemicalSource {
    /// A fully charged source.
    #[must_use]
    pub fn new(
        position: Point,
        strength: f64,
        decay_factor: f64,
        max_energy: f64,
        depletion_rate: f64,
    ) -> Self {
        let max_energy = max_energy.max(0.0);
        Self {
            position,
            strength: strength.max(0.0),
            decay_factor: decay_factor.max(0.0),
            energy: max_energy,
            max_energy,
            depletion_rate: depletion_rate.max(0.0),
            active: max_energy > 0.0,
        }
    }
}
