//! Point-in-time population and field statistics.

use crate::world::WorldCoordinator;
use chemotaxis_data::{Point, Rect};
use serde::{Deserialize, Serialize};

/// One row of simulation statistics, keyed by simulated time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldStats {
    pub time: f64,
    pub organism_count: usize,
    pub preference_mean: f64,
    pub preference_stddev: f64,
    pub preference_min: f64,
    pub preference_max: f64,
    /// Mean concentration at organism positions.
    pub avg_concentration: f64,
    pub avg_energy: f64,
    pub avg_energy_ratio: f64,
    pub max_generation: u32,
    pub source_count: usize,
    pub active_source_count: usize,
    pub field_min: f64,
    pub field_max: f64,
    pub field_avg: f64,
    pub total_energy: f64,
    pub target_energy: f64,
}

/// Mean, population standard deviation, min and max. All zero when empty.
#[must_use]
pub fn summarize(values: &[f64]) -> (f64, f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (mean, variance.sqrt(), min, max)
}

/// Centres of an `n x n` grid of equal cells covering `bounds`.
#[must_use]
pub fn sample_points(bounds: Rect, resolution: usize) -> Vec<Point> {
    let n = resolution.max(1);
    let dx = bounds.width / n as f64;
    let dy = bounds.height / n as f64;
    (0..n)
        .flat_map(|j| (0..n).map(move |i| Point::new((i as f64 + 0.5) * dx, (j as f64 + 0.5) * dy)))
        .collect()
}

/// Collects statistics from snapshots of `world`.
#[must_use]
pub fn collect(world: &WorldCoordinator, time: f64, resolution: usize) -> WorldStats {
    let organisms = world.organisms();
    let sources = world.chemical_sources();
    let (total_energy, target_energy) = world.system_energy_info();

    let preferences: Vec<f64> = organisms.iter().map(|o| o.chem_preference).collect();
    let (preference_mean, preference_stddev, preference_min, preference_max) =
        summarize(&preferences);

    let positions: Vec<Point> = organisms.iter().map(|o| o.position).collect();
    let (avg_concentration, ..) = summarize(&world.concentrations_at(&positions));

    let energies: Vec<f64> = organisms.iter().map(|o| o.energy).collect();
    let ratios: Vec<f64> = organisms.iter().map(|o| o.energy_ratio()).collect();

    let samples = world.concentrations_at(&sample_points(world.bounds(), resolution));
    let (field_avg, _, field_min, field_max) = summarize(&samples);

    WorldStats {
        time,
        organism_count: organisms.len(),
        preference_mean,
        preference_stddev,
        preference_min,
        preference_max,
        avg_concentration,
        avg_energy: summarize(&energies).0,
        avg_energy_ratio: summarize(&ratios).0,
        max_generation: organisms.iter().map(|o| o.generation).max().unwrap_or(0),
        source_count: sources.len(),
        active_source_count: sources.iter().filter(|s| s.active).count(),
        field_min,
        field_max,
        field_avg,
        total_energy,
        target_energy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), (0.0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn test_summarize_values() {
        let (mean, std, min, max) = summarize(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(mean, 5.0);
        assert_eq!(std, 2.0);
        assert_eq!(min, 2.0);
        assert_eq!(max, 9.0);
    }

    #[test]
    fn test_sample_points_are_cell_centres() {
        let points = sample_points(Rect::new(10.0, 20.0), 2);
        assert_eq!(
            points,
            vec![
                Point::new(2.5, 5.0),
                Point::new(7.5, 5.0),
                Point::new(2.5, 15.0),
                Point::new(7.5, 15.0),
            ]
        );
    }

    #[test]
    fn test_collect_from_fresh_world() {
        let mut config = AppConfig::default();
        config.organism.count = 25;
        let world = WorldCoordinator::new(config.clone()).unwrap();
        let stats = collect(&world, 1.5, 10);

        assert_eq!(stats.time, 1.5);
        assert_eq!(stats.organism_count, 25);
        assert_eq!(stats.source_count, config.chemical.count);
        assert_eq!(stats.active_source_count, config.chemical.count);
        assert_eq!(stats.max_generation, 1);
        assert!(stats.preference_min <= stats.preference_mean);
        assert!(stats.preference_mean <= stats.preference_max);
        assert!(stats.field_min <= stats.field_avg && stats.field_avg <= stats.field_max);
        assert!(stats.field_max > 0.0);
        assert!((stats.avg_energy - config.energy.initial_energy).abs() < 1e-9);
        assert_eq!(stats.total_energy, stats.target_energy);
    }
}
