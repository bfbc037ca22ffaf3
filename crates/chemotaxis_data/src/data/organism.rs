use super::geometry::Point;
use serde::{Deserialize, Serialize};

/// Sensor offsets from the heading, in radians.
///
/// Left offsets are positive (counter-clockwise), right offsets negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorAngles {
    pub front: f64,
    pub left: f64,
    pub right: f64,
}

impl SensorAngles {
    /// Symmetric layout: front straight ahead, left/right at `spread`.
    #[must_use]
    pub fn symmetric(spread: f64) -> Self {
        Self {
            front: 0.0,
            left: spread.abs(),
            right: -spread.abs(),
        }
    }

    /// Offsets in sensing order: front, left, right.
    #[must_use]
    pub fn as_array(&self) -> [f64; 3] {
        [self.front, self.left, self.right]
    }
}

impl Default for SensorAngles {
    fn default() -> Self {
        Self::symmetric(std::f64::consts::FRAC_PI_4)
    }
}

/// Heritable energy-economy traits of an organism.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetabolicTraits {
    /// Base energy burned per second.
    pub metabolic_rate: f64,
    /// Energy per unit distance travelled.
    pub movement_cost: f64,
    /// Energy per sensor reading per second.
    pub sensing_cost: f64,
    /// Energy gained per second at a perfect preference match.
    pub optimal_gain: f64,
    /// Multiplier applied to every expenditure.
    pub energy_efficiency: f64,
}

/// A single-cell organism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organism {
    pub id: u64,
    pub parent_id: Option<u64>,
    /// 1 for initially populated organisms.
    pub generation: u32,
    pub position: Point,
    /// Radians in `[0, 2π)`.
    pub heading: f64,
    pub previous_heading: f64,
    /// Concentration this organism seeks.
    pub chem_preference: f64,
    /// World units per second.
    pub speed: f64,
    pub sensor_angles: SensorAngles,
    pub energy: f64,
    pub energy_capacity: f64,
    pub metabolism: MetabolicTraits,
    pub time_since_reproduction: f64,
    pub mark_for_removal: bool,
}

impl Organism {
    #[must_use]
    pub fn energy_ratio(&self) -> f64 {
        if self.energy_capacity > 0.0 {
            self.energy / self.energy_capacity
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.mark_for_removal
    }
}
