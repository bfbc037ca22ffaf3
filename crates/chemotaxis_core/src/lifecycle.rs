use crate::config::AppConfig;
use crate::ledger::sample_range;
use chemotaxis_data::{ChemicalSource, MetabolicTraits, Organism, Point, SensorAngles};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::TAU;

/// Freshly populated world contents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Population {
    pub organisms: Vec<Organism>,
    pub sources: Vec<ChemicalSource>,
}

/// Samples a chemical preference from the configured normal distribution,
/// clamped to the configured minimum.
pub fn sample_preference<R: Rng + ?Sized>(config: &AppConfig, rng: &mut R) -> f64 {
    let o = &config.organism;
    let raw = match Normal::new(o.preference_mean, o.preference_stddev) {
        Ok(normal) => normal.sample(rng),
        Err(_) => o.preference_mean,
    };
    raw.max(o.preference_min)
}

/// A first-generation organism at `position` with a random heading.
pub fn create_organism_with_rng<R: Rng + ?Sized>(
    id: u64,
    position: Point,
    config: &AppConfig,
    rng: &mut R,
) -> Organism {
    let heading = rng.gen_range(0.0..TAU);
    let e = &config.energy;
    Organism {
        id,
        parent_id: None,
        generation: 1,
        position,
        heading,
        previous_heading: heading,
        chem_preference: sample_preference(config, rng),
        speed: config.organism.speed,
        sensor_angles: SensorAngles::symmetric(config.organism.sensor_angle),
        energy: e.initial_energy.min(e.max_energy),
        energy_capacity: e.max_energy,
        metabolism: MetabolicTraits {
            metabolic_rate: e.metabolic_rate,
            movement_cost: e.movement_cost,
            sensing_cost: e.sensing_cost,
            optimal_gain: e.optimal_gain_rate,
            energy_efficiency: sample_range(rng, e.efficiency_min, e.efficiency_max),
        },
        time_since_reproduction: 0.0,
        mark_for_removal: false,
    }
}

/// A fully charged source at a uniform position inside the world.
pub fn create_source_with_rng<R: Rng + ?Sized>(config: &AppConfig, rng: &mut R) -> ChemicalSource {
    let c = &config.chemical;
    let position = Point::new(
        sample_range(rng, 0.0, config.world.width),
        sample_range(rng, 0.0, config.world.height),
    );
    ChemicalSource::new(
        position,
        sample_range(rng, c.strength_min, c.strength_max),
        sample_range(rng, c.decay_min, c.decay_max),
        c.source_max_energy,
        c.depletion_rate,
    )
}

/// Builds the initial organisms and sources. Organism ids run from 1.
pub fn populate<R: Rng + ?Sized>(config: &AppConfig, rng: &mut R) -> Population {
    let margin = config.organism.spawn_margin;
    let organisms = (1..=config.organism.count as u64)
        .map(|id| {
            let position = Point::new(
                sample_range(rng, margin, config.world.width - margin),
                sample_range(rng, margin, config.world.height - margin),
            );
            create_organism_with_rng(id, position, config, rng)
        })
        .collect();
    let sources = (0..config.chemical.count)
        .map(|_| create_source_with_rng(config, rng))
        .collect();
    Population { organisms, sources }
}
