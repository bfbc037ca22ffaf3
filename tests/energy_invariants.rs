mod common;
use chemotaxis_core::config::FieldMode;
use chemotaxis_core::{Simulator, WorldCoordinator};
use common::{seeded_config, source, OrganismBuilder, WorldBuilder};

#[test]
fn test_energy_bounded_every_step() {
    for mode in [FieldMode::Direct, FieldMode::Grid] {
        let mut config = seeded_config(2024);
        config.field.mode = mode;
        let world = WorldCoordinator::new(config).unwrap();

        for _ in 0..200 {
            world.advance(0.05).unwrap();
            assert_energy_bounded!(world);
            let bounds = world.bounds();
            for o in world.organisms() {
                assert!(bounds.contains(o.position));
                assert!(o.heading.is_finite());
            }
        }
    }
}

#[test]
fn test_energy_bounded_at_max_speed() {
    let mut config = seeded_config(9);
    config.organism.count = 200;
    let sim = Simulator::new(config).unwrap();
    assert_eq!(sim.set_simulation_speed(1_000.0), 10.0);

    for _ in 0..100 {
        sim.step().unwrap();
        assert_energy_bounded!(sim.world());
    }
}

#[test]
fn test_starving_organism_is_removed_at_zero() {
    let world = WorldBuilder::new()
        .with_organism(OrganismBuilder::new().energy(0.01, 100.0).build())
        .build();

    let report = world.advance(0.5).unwrap();

    assert_eq!(report.deaths, 1);
    assert_population!(world, 0);
    assert_eq!(world.metrics().deaths(), 1);
}

#[test]
fn test_feeding_draws_from_sources() {
    // Concentration at the organism equals its preference: full feeding.
    let world = WorldBuilder::new()
        .with_field_mode(FieldMode::Direct)
        .with_source(source(50.0, 50.0, 40.0, 0.0, 1_000.0))
        .with_organism(
            OrganismBuilder::new()
                .at(50.0, 50.0)
                .preference(40.0)
                .energy(50.0, 100.0)
                .speed(0.0)
                .build(),
        )
        .build();
    let (before, _) = world.system_energy_info();

    let report = world.advance(1.0).unwrap();

    let organism = &world.organisms()[0];
    let spent = 0.5 + 0.02 * 3.0;
    assert_approx!(organism.energy, 50.0 - spent + 2.0, 1e-9);
    assert_approx!(report.energy_drawn, 2.0 * world.config().chemical.consumption_multiplier, 1e-9);
    let (after, _) = world.system_energy_info();
    assert_approx!(before - after, report.energy_drawn, 1e-9);
}

#[test]
fn test_full_organism_takes_nothing() {
    let world = WorldBuilder::new()
        .with_field_mode(FieldMode::Direct)
        .with_source(source(50.0, 50.0, 40.0, 0.0, 1_000.0))
        .with_organism(
            OrganismBuilder::new()
                .at(50.0, 50.0)
                .preference(40.0)
                .energy(100.0, 100.0)
                .speed(0.0)
                .idle()
                .build(),
        )
        .build();

    let report = world.advance(1.0).unwrap();

    assert_eq!(report.energy_drawn, 0.0);
    assert_eq!(world.organisms()[0].energy, 100.0);
}
