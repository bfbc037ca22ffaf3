//! Heritable trait perturbation.
//!
//! Every continuous trait goes through [`mutate_trait`]: a multiplicative
//! Gaussian factor `1 + N(0, magnitude)` with the noise clamped to three
//! standard deviations and the result floored above zero.

use crate::config::AppConfig;
use chemotaxis_data::{Organism, SensorAngles};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Smallest value any mutated trait may take.
pub const MIN_TRAIT_VALUE: f64 = 1e-3;
/// Noise is clamped to this many standard deviations.
pub const MAX_SIGMA: f64 = 3.0;

/// Multiplies `value` by `1 + N(0, magnitude)` and floors the result.
pub fn mutate_trait<R: Rng + ?Sized>(value: f64, magnitude: f64, floor: f64, rng: &mut R) -> f64 {
    if magnitude.is_nan() || magnitude <= 0.0 || !magnitude.is_finite() {
        return value.max(floor);
    }
    let noise = match Normal::new(0.0, magnitude) {
        Ok(normal) => normal.sample(rng),
        Err(_) => 0.0,
    };
    let bound = MAX_SIGMA * magnitude;
    (value * (1.0 + noise.clamp(-bound, bound))).max(floor)
}

/// Like [`mutate_trait`] but keeps the sign of `value`; zero stays zero.
pub fn mutate_signed<R: Rng + ?Sized>(value: f64, magnitude: f64, ceiling: f64, rng: &mut R) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let mutated = mutate_trait(value.abs(), magnitude, MIN_TRAIT_VALUE, rng).min(ceiling);
    mutated.copysign(value)
}

/// Relative mutation magnitudes per trait group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationProfile {
    pub preference: f64,
    pub cost: f64,
    pub speed: f64,
    pub gain: f64,
    pub sensor: f64,
    pub preference_floor: f64,
}

impl MutationProfile {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let r = &config.reproduction;
        Self {
            preference: r.preference_mutation,
            cost: r.cost_mutation,
            speed: r.speed_mutation,
            gain: r.gain_mutation,
            sensor: r.sensor_mutation,
            preference_floor: config.organism.preference_min.max(MIN_TRAIT_VALUE),
        }
    }

    /// A profile that leaves every trait unchanged.
    #[must_use]
    pub fn none() -> Self {
        Self {
            preference: 0.0,
            cost: 0.0,
            speed: 0.0,
            gain: 0.0,
            sensor: 0.0,
            preference_floor: MIN_TRAIT_VALUE,
        }
    }
}

/// Perturbs every heritable trait of `organism` independently.
pub fn mutate_organism<R: Rng + ?Sized>(organism: &mut Organism, profile: &MutationProfile, rng: &mut R) {
    organism.chem_preference = mutate_trait(
        organism.chem_preference,
        profile.preference,
        profile.preference_floor,
        rng,
    );
    organism.speed = mutate_trait(organism.speed, profile.speed, MIN_TRAIT_VALUE, rng);
    organism.sensor_angles = mutate_sensors(&organism.sensor_angles, profile.sensor, rng);

    let m = &mut organism.metabolism;
    m.metabolic_rate = mutate_trait(m.metabolic_rate, profile.cost, MIN_TRAIT_VALUE, rng);
    m.movement_cost = mutate_trait(m.movement_cost, profile.cost, MIN_TRAIT_VALUE, rng);
    m.sensing_cost = mutate_trait(m.sensing_cost, profile.cost, MIN_TRAIT_VALUE, rng);
    m.optimal_gain = mutate_trait(m.optimal_gain, profile.gain, MIN_TRAIT_VALUE, rng);
    m.energy_efficiency = mutate_trait(m.energy_efficiency, profile.cost, MIN_TRAIT_VALUE, rng);
}

fn mutate_sensors<R: Rng + ?Sized>(angles: &SensorAngles, magnitude: f64, rng: &mut R) -> SensorAngles {
    SensorAngles {
        front: mutate_signed(angles.front, magnitude, PI, rng),
        left: mutate_signed(angles.left, magnitude, PI, rng),
        right: mutate_signed(angles.right, magnitude, PI, rng),
    }
}
