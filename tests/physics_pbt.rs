mod common;
use chemotaxis_core::behavior::{decide, move_organism, similarity, steer, wrap_angle};
use chemotaxis_core::mutation::{mutate_trait, MAX_SIGMA};
use chemotaxis_core::SourceLogic;
use chemotaxis_data::{ChemicalSource, Point, Rect, SensorAngles};
use common::OrganismBuilder;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::TAU;

prop_compose! {
    fn arb_position()(
        x in 0.0f64..100.0,
        y in 0.0f64..100.0
    ) -> (f64, f64) {
        (x, y)
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn test_wrap_angle_range(angle in -1.0e6f64..1.0e6) {
        let wrapped = wrap_angle(angle);
        prop_assert!((0.0..TAU).contains(&wrapped), "{} -> {}", angle, wrapped);
        let turns = (angle - wrapped) / TAU;
        prop_assert!((turns - turns.round()).abs() < 1e-6);
    }

    #[test]
    fn test_movement_stays_in_bounds(
        (x, y) in arb_position(),
        heading in 0.0f64..TAU,
        speed in 0.0f64..500.0,
        dt in 0.001f64..1.0
    ) {
        let bounds = Rect::new(100.0, 100.0);
        let mut o = OrganismBuilder::new().at(x, y).heading(heading).speed(speed).build();
        move_organism(&mut o, bounds, dt);
        prop_assert!(bounds.contains(o.position), "escaped to {:?}", o.position);
        prop_assert!((0.0..TAU).contains(&o.heading));
    }

    #[test]
    fn test_steering_is_rate_limited(
        heading in 0.0f64..TAU,
        target in -3.0f64..3.0,
        turn_speed in 0.0f64..10.0,
        dt in 0.001f64..1.0
    ) {
        let mut o = OrganismBuilder::new().heading(heading).build();
        steer(&mut o, target, turn_speed, dt);
        let turned = (o.heading - heading + TAU / 2.0).rem_euclid(TAU) - TAU / 2.0;
        prop_assert!(turned.abs() <= turn_speed * dt + 1e-9);
        prop_assert_eq!(o.previous_heading, heading);
    }

    #[test]
    fn test_decision_picks_a_sensor(
        readings in prop::array::uniform3(0.0f64..200.0),
        preference in 1.0f64..150.0
    ) {
        let angles = SensorAngles::default();
        let offset = decide(readings, preference, &angles);
        prop_assert!(offset == angles.front || offset == angles.left || offset == angles.right);

        let chosen = match offset {
            o if o == angles.left => readings[1],
            o if o == angles.right => readings[2],
            _ => readings[0],
        };
        let best = readings
            .iter()
            .map(|r| (r - preference).abs())
            .fold(f64::INFINITY, f64::min);
        // An exact left/right tie goes straight regardless of the front reading.
        if (readings[1] - preference).abs() != (readings[2] - preference).abs() {
            prop_assert!((chosen - preference).abs() <= best + 1e-12);
        }
    }

    #[test]
    fn test_similarity_in_unit_range(
        concentration in -100.0f64..1_000.0,
        preference in 0.01f64..500.0
    ) {
        let s = similarity(concentration, preference);
        prop_assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn test_mutation_bounded(
        value in 0.001f64..1_000.0,
        magnitude in 0.0f64..0.3,
        seed in any::<u64>()
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let floor = 1e-3;
        let mutated = mutate_trait(value, magnitude, floor, &mut rng);
        prop_assert!(mutated >= floor);
        let lo = (value * (1.0 - MAX_SIGMA * magnitude)).max(floor);
        let hi = value * (1.0 + MAX_SIGMA * magnitude);
        prop_assert!(mutated >= lo - 1e-9 && mutated <= hi + 1e-9, "{} -> {}", value, mutated);
    }

    #[test]
    fn test_source_update_monotonic(
        energy in 0.0f64..5_000.0,
        rate in 0.0f64..100.0,
        dt in 0.0f64..5.0
    ) {
        let mut s = ChemicalSource::new(Point::new(1.0, 1.0), 10.0, 0.01, 5_000.0, rate);
        s.energy = energy;
        s.active = energy > 0.0;
        let before = s.energy;
        s.update(dt);
        prop_assert!(s.energy <= before);
        prop_assert!(s.energy >= 0.0);
        if before > 0.0 && rate * dt > 1e-9 {
            prop_assert!(s.energy < before);
        }
        prop_assert_eq!(s.active, s.energy > 0.0);
    }

    #[test]
    fn test_concentration_non_negative(
        (x, y) in arb_position(),
        strength in 0.0f64..500.0,
        decay in 0.0f64..1.0,
        fill in 0.0f64..=1.0
    ) {
        let mut s = ChemicalSource::new(Point::new(50.0, 50.0), strength, decay, 100.0, 0.0);
        s.energy = 100.0 * fill;
        s.active = s.energy > 0.0;
        let c = s.concentration_at(Point::new(x, y));
        prop_assert!(c.is_finite() && c >= 0.0 && c <= strength + 1e-9);
    }
}
