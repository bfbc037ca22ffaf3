mod common;
use chemotaxis_core::config::{ChemicalConfig, FieldMode};
use chemotaxis_core::field::{ConcentrationField, DirectField};
use chemotaxis_core::{EnergyLedger, SourceLogic};
use chemotaxis_data::{ChemicalSource, Point, Rect};
use common::{source, WorldBuilder};

fn bounds() -> Rect {
    Rect::new(100.0, 100.0)
}

#[test]
fn test_depletion_to_deactivation() {
    let policy = ChemicalConfig::default();
    let mut sources = vec![ChemicalSource::new(Point::new(50.0, 50.0), 100.0, 0.1, 1.0, 0.5)];
    let mut ledger = EnergyLedger::new(&policy, bounds(), &sources);
    assert_approx!(ledger.total(), 1.0, 1e-12);

    let removed = ledger.deplete(&mut sources, Point::new(51.0, 50.0), 100.0);

    assert_approx!(removed, 1.0, 1e-12);
    assert_eq!(sources[0].energy, 0.0);
    assert!(!sources[0].active);
    assert_eq!(ledger.total(), 0.0);
    for p in [Point::new(50.0, 50.0), Point::new(0.0, 0.0), Point::new(99.0, 10.0)] {
        assert_eq!(sources[0].concentration_at(p), 0.0);
        assert_eq!(DirectField::new(&sources).concentration_at(p), 0.0);
    }

    // Drained sources take nothing further.
    assert_eq!(ledger.deplete(&mut sources, Point::new(50.0, 50.0), 10.0), 0.0);
}

#[test]
fn test_consumption_split_by_contribution() {
    let policy = ChemicalConfig {
        consumption_multiplier: 1.0,
        ..Default::default()
    };
    let mut sources = vec![
        ChemicalSource::new(Point::new(40.0, 50.0), 100.0, 0.0, 1_000.0, 0.0),
        ChemicalSource::new(Point::new(60.0, 50.0), 300.0, 0.0, 1_000.0, 0.0),
    ];
    let mut ledger = EnergyLedger::new(&policy, bounds(), &sources);

    let removed = ledger.deplete(&mut sources, Point::new(50.0, 50.0), 8.0);

    assert_approx!(removed, 8.0, 1e-9);
    assert_approx!(sources[0].energy, 998.0, 1e-9);
    assert_approx!(sources[1].energy, 994.0, 1e-9);
    assert_approx!(ledger.total(), 1_992.0, 1e-9);
}

#[test]
fn test_multiplier_scales_draw() {
    let policy = ChemicalConfig {
        consumption_multiplier: 2.5,
        ..Default::default()
    };
    let mut sources = vec![source(50.0, 50.0, 100.0, 0.01, 1_000.0)];
    let mut ledger = EnergyLedger::new(&policy, bounds(), &sources);
    let removed = ledger.deplete(&mut sources, Point::new(50.0, 50.0), 4.0);
    assert_approx!(removed, 10.0, 1e-9);
    assert_approx!(sources[0].energy, 990.0, 1e-9);
}

#[test]
fn test_passive_update_is_monotonic() {
    for dt in [0.0, 1e-6, 0.05, 0.5, 3.0, 1_000.0] {
        for energy in [0.0, 0.3, 10.0, 2_500.0] {
            let mut s = ChemicalSource::new(Point::new(1.0, 1.0), 50.0, 0.01, 2_500.0, 2.0);
            s.energy = energy;
            s.active = energy > 0.0;
            let before = s.energy;
            let was_active = s.active;

            let removed = s.update(dt);

            assert!(s.energy <= before, "dt={dt} energy={energy}");
            assert_approx!(before - s.energy, removed, 1e-12);
            if dt > 0.0 && was_active {
                assert!(s.energy < before, "active source did not deplete (dt={dt})");
            }
            assert_eq!(s.active, s.energy > 0.0);
        }
    }
}

#[test]
fn test_world_source_drains_and_field_clears() {
    for mode in [FieldMode::Direct, FieldMode::Grid] {
        let world = WorldBuilder::new()
            .with_field_mode(mode)
            .with_source(ChemicalSource::new(Point::new(50.0, 50.0), 100.0, 0.01, 1.0, 10.0))
            .build();
        assert!(world.concentration_at(Point::new(50.0, 50.0)) > 0.0);

        world.advance(0.5).unwrap();

        let sources = world.chemical_sources();
        assert_eq!(sources[0].energy, 0.0);
        assert!(!sources[0].active);
        assert_eq!(world.active_source_count(), 0);
        assert_eq!(world.system_energy_info().0, 0.0);
        assert_eq!(world.concentration_at(Point::new(50.0, 50.0)), 0.0, "{mode:?}");
    }
}

#[test]
fn test_world_sources_never_gain_without_regeneration() {
    let world = WorldBuilder::new()
        .with_seed(3)
        .with_config(|c| {
            c.organism.count = 30;
            c.chemical.count = 6;
            c.chemical.source_max_energy = 300.0;
        })
        .build();

    let mut previous = world.chemical_sources();
    for _ in 0..100 {
        world.advance(0.1).unwrap();
        let current = world.chemical_sources();
        for (before, after) in previous.iter().zip(&current) {
            assert!(after.energy <= before.energy);
        }
        previous = current;
    }
}

#[test]
fn test_ledger_total_tracks_sources() {
    let world = WorldBuilder::new()
        .with_seed(8)
        .with_config(|c| {
            c.organism.count = 50;
            c.chemical.count = 10;
            c.chemical.regeneration_probability = 1.0;
        })
        .build();
    for _ in 0..200 {
        world.advance(0.05).unwrap();
    }
    let drift = world.recompute_energy_total();
    assert!(drift.abs() < 1e-6, "ledger drifted by {drift}");
}
