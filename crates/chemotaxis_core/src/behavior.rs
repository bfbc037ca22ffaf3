//! Per-organism behaviour: sensing, greedy steering, movement, metabolism
//! and reproduction.
//!
//! These are free functions over a single [`Organism`]. The environment is
//! passed in as a capability (`ConcentrationField` to read, `EnergySink` to
//! feed from) so nothing here holds a reference back to the world.

use crate::config::AppConfig;
use crate::field::ConcentrationField;
use crate::ledger::{sample_range, EnergySink};
use crate::mutation::{mutate_organism, MutationProfile};
use chemotaxis_data::{Organism, Point, Rect, SensorAngles};
use rand::Rng;
use std::f64::consts::{PI, TAU};

/// Number of sensors every organism carries.
pub const SENSOR_COUNT: usize = 3;

/// Behaviour constants resolved once per step from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorParams {
    pub bounds: Rect,
    pub sensor_distance: f64,
    /// Radians per second.
    pub turn_speed: f64,
    pub similarity_threshold: f64,
    pub reproduction_threshold: f64,
    pub cooldown: f64,
    pub offspring_ratio: f64,
    pub spawn_distance_min: f64,
    pub spawn_distance_max: f64,
    pub mutation: MutationProfile,
}

impl BehaviorParams {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            bounds: Rect::new(config.world.width, config.world.height),
            sensor_distance: config.organism.sensor_distance,
            turn_speed: config.organism.turn_speed,
            similarity_threshold: config.energy.gain_similarity_threshold,
            reproduction_threshold: config.reproduction.threshold,
            cooldown: config.reproduction.cooldown,
            offspring_ratio: config.reproduction.offspring_ratio,
            spawn_distance_min: config.reproduction.spawn_distance_min,
            spawn_distance_max: config.reproduction.spawn_distance_max,
            mutation: MutationProfile::from_config(config),
        }
    }
}

/// Energy movement produced by one [`update_energy`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyDelta {
    pub spent: f64,
    pub gained: f64,
    /// Energy the sink removed from sources on behalf of this organism.
    pub drawn: f64,
    pub died: bool,
}

/// Wraps an angle into `[0, 2π)`. Non-finite input maps to 0.
#[must_use]
pub fn wrap_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// World positions of the front, left and right sensors.
#[must_use]
pub fn sensor_positions(organism: &Organism, sensor_distance: f64) -> [Point; SENSOR_COUNT] {
    organism
        .sensor_angles
        .as_array()
        .map(|offset| organism.position.offset(organism.heading + offset, sensor_distance))
}

/// Concentration at each sensor, in front/left/right order.
pub fn sense<F: ConcentrationField + ?Sized>(
    organism: &Organism,
    field: &F,
    sensor_distance: f64,
) -> [f64; SENSOR_COUNT] {
    sensor_positions(organism, sensor_distance).map(|p| field.concentration_at(p))
}

/// Greedy choice: the heading offset of the sensor whose reading is
/// closest to `preference`.
///
/// Front wins every tie, and an exact left/right tie also keeps the
/// organism going straight.
#[must_use]
pub fn decide(readings: [f64; SENSOR_COUNT], preference: f64, angles: &SensorAngles) -> f64 {
    let [front, left, right] = readings.map(|r| {
        let diff = (r - preference).abs();
        if diff.is_nan() {
            f64::INFINITY
        } else {
            diff
        }
    });
    if front <= left.min(right) {
        0.0
    } else if left < right {
        angles.left
    } else if right < left {
        angles.right
    } else {
        0.0
    }
}

/// Turns toward `target_offset`, at most `turn_speed * dt` radians.
pub fn steer(organism: &mut Organism, target_offset: f64, turn_speed: f64, dt: f64) {
    let max_turn = (turn_speed * dt).max(0.0);
    let turn = if target_offset.is_finite() {
        target_offset.clamp(-max_turn, max_turn)
    } else {
        0.0
    };
    organism.previous_heading = organism.heading;
    organism.heading = wrap_angle(organism.heading + turn);
}

/// Advances along the heading. Walls clamp the position and reflect the
/// heading away from the wall. Returns whether a wall was hit.
pub fn move_organism(organism: &mut Organism, bounds: Rect, dt: f64) -> bool {
    let distance = (organism.speed * dt).max(0.0);
    let next = organism.position.offset(organism.heading, distance);
    if !next.is_finite() {
        return false;
    }

    let mut heading = organism.heading;
    let hit_x = next.x < 0.0 || next.x >= bounds.width;
    let hit_y = next.y < 0.0 || next.y >= bounds.height;
    if hit_x {
        heading = PI - heading;
    }
    if hit_y {
        heading = -heading;
    }

    organism.position = bounds.clamp(next);
    organism.heading = wrap_angle(heading);
    hit_x || hit_y
}

/// `1 - min(|concentration - preference| / preference, 1)`.
#[must_use]
pub fn similarity(concentration: f64, preference: f64) -> f64 {
    if preference <= 0.0 || !preference.is_finite() || !concentration.is_finite() {
        return 0.0;
    }
    1.0 - ((concentration - preference).abs() / preference).min(1.0)
}

/// Similarity above `threshold` rescaled linearly onto `(0, 1]`.
#[must_use]
pub fn feeding_factor(similarity: f64, threshold: f64) -> f64 {
    if similarity <= threshold || threshold >= 1.0 {
        return 0.0;
    }
    ((similarity - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
}

/// Energy burned over `dt`: metabolism, movement and sensing, scaled by
/// efficiency.
#[must_use]
pub fn expenditure(organism: &Organism, dt: f64) -> f64 {
    let m = &organism.metabolism;
    let base = m.metabolic_rate
        + m.movement_cost * organism.speed
        + m.sensing_cost * SENSOR_COUNT as f64;
    (base * m.energy_efficiency * dt).max(0.0)
}

/// Pays the step's expenditure, then feeds when the local concentration is
/// close enough to the organism's preference.
///
/// Feeding draws the gained energy from `env`. An organism that ends at or
/// below zero is clamped to 0 and marked for removal.
pub fn update_energy<E: ConcentrationField + EnergySink + ?Sized>(
    organism: &mut Organism,
    env: &mut E,
    params: &BehaviorParams,
    dt: f64,
) -> EnergyDelta {
    let mut delta = EnergyDelta {
        spent: expenditure(organism, dt),
        ..Default::default()
    };
    organism.energy = (organism.energy - delta.spent).min(organism.energy_capacity);

    let concentration = env.concentration_at(organism.position);
    let factor = feeding_factor(
        similarity(concentration, organism.chem_preference),
        params.similarity_threshold,
    );
    if factor > 0.0 {
        let gain = organism.metabolism.optimal_gain * factor * dt;
        let headroom = (organism.energy_capacity - organism.energy).max(0.0);
        delta.gained = gain.min(headroom).max(0.0);
        if delta.gained > 0.0 {
            organism.energy += delta.gained;
            delta.drawn = env.deplete(organism.position, delta.gained);
        }
    }

    if organism.energy <= 0.0 || organism.energy.is_nan() {
        organism.energy = 0.0;
        organism.mark_for_removal = true;
        delta.died = true;
    }
    delta
}

#[must_use]
pub fn can_reproduce(organism: &Organism, params: &BehaviorParams) -> bool {
    organism.is_alive()
        && organism.energy >= organism.energy_capacity * params.reproduction_threshold
        && organism.time_since_reproduction >= params.cooldown
}

/// Splits off a mutated offspring.
///
/// The offspring takes `offspring_ratio` of the parent's energy and lands a
/// random 5-10 units away (clamped into bounds) with a random heading.
pub fn reproduce<R: Rng + ?Sized>(
    parent: &mut Organism,
    child_id: u64,
    params: &BehaviorParams,
    rng: &mut R,
) -> Organism {
    let endowment = parent.energy * params.offspring_ratio;
    parent.energy -= endowment;
    parent.time_since_reproduction = 0.0;

    let angle = rng.gen_range(0.0..TAU);
    let distance = sample_range(rng, params.spawn_distance_min, params.spawn_distance_max);
    let heading = rng.gen_range(0.0..TAU);

    let mut child = Organism {
        id: child_id,
        parent_id: Some(parent.id),
        generation: parent.generation.saturating_add(1),
        position: params.bounds.clamp(parent.position.offset(angle, distance)),
        heading,
        previous_heading: heading,
        energy: endowment,
        time_since_reproduction: 0.0,
        mark_for_removal: false,
        ..parent.clone()
    };
    mutate_organism(&mut child, &params.mutation, rng);
    child
}

/// One full behaviour step: sense, decide, steer, move, feed, age.
pub fn tick<E: ConcentrationField + EnergySink + ?Sized>(
    organism: &mut Organism,
    env: &mut E,
    params: &BehaviorParams,
    dt: f64,
) -> EnergyDelta {
    if organism.mark_for_removal {
        return EnergyDelta::default();
    }
    let readings = sense(organism, env, params.sensor_distance);
    let target = decide(readings, organism.chem_preference, &organism.sensor_angles);
    steer(organism, target, params.turn_speed, dt);
    move_organism(organism, params.bounds, dt);
    let delta = update_energy(organism, env, params, dt);
    organism.time_since_reproduction += dt;
    delta
}
