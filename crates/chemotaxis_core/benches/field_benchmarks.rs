use chemotaxis_core::config::{AppConfig, FieldConfig, FieldMode};
use chemotaxis_core::field::{ChemicalField, ConcentrationField, ConcentrationGrid, DirectField};
use chemotaxis_core::lifecycle;
use chemotaxis_core::world::WorldCoordinator;
use chemotaxis_data::{ChemicalSource, Point, Rect};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn setup_sources(count: usize) -> (Vec<ChemicalSource>, Rect) {
    let mut config = AppConfig::default();
    config.chemical.count = count;
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let sources = (0..count)
        .map(|_| lifecycle::create_source_with_rng(&config, &mut rng))
        .collect();
    (sources, Rect::new(config.world.width, config.world.height))
}

fn query_points(bounds: Rect, count: usize) -> Vec<Point> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    (0..count)
        .map(|_| Point::new(rng.gen_range(0.0..bounds.width), rng.gen_range(0.0..bounds.height)))
        .collect()
}

/// Benchmark direct superposition lookups.
fn bench_direct_lookup(c: &mut Criterion) {
    let (sources, bounds) = setup_sources(20);
    let points = query_points(bounds, 1000);
    let field = DirectField::new(&sources);

    c.bench_function("direct_lookup_1000", |b| {
        b.iter(|| {
            let sum: f64 = points.iter().map(|p| field.concentration_at(*p)).sum();
            black_box(sum)
        })
    });
}

/// Benchmark bilinear grid lookups against a warm cache.
fn bench_grid_lookup(c: &mut Criterion) {
    let (sources, bounds) = setup_sources(20);
    let points = query_points(bounds, 1000);
    let field = ChemicalField::new(bounds, &FieldConfig::default());
    let grid = field.grid(&sources);

    c.bench_function("grid_lookup_1000", |b| {
        b.iter(|| {
            let sum: f64 = points.iter().map(|p| grid.concentration_at(*p)).sum();
            black_box(sum)
        })
    });
}

/// Benchmark gradient estimation.
fn bench_gradient(c: &mut Criterion) {
    let (sources, bounds) = setup_sources(20);
    let points = query_points(bounds, 1000);
    let field = DirectField::new(&sources);

    c.bench_function("direct_gradient_1000", |b| {
        b.iter(|| {
            for p in &points {
                black_box(field.gradient_at(*p));
            }
        })
    });
}

/// Benchmark a full grid rebuild.
fn bench_grid_build(c: &mut Criterion) {
    let (sources, bounds) = setup_sources(20);

    c.bench_function("grid_build_400x300", |b| {
        b.iter(|| {
            let grid = ConcentrationGrid::sample(&DirectField::new(&sources), bounds, 5.0);
            black_box(grid)
        })
    });
}

/// Benchmark a whole world step in each field mode.
fn bench_world_step(c: &mut Criterion) {
    for mode in [FieldMode::Direct, FieldMode::Grid] {
        let mut config = AppConfig::default();
        config.field.mode = mode;
        let world = WorldCoordinator::new(config).expect("default config is valid");

        c.bench_function(&format!("world_step_{mode:?}"), |b| {
            b.iter(|| black_box(world.advance(0.05)))
        });
    }
}

criterion_group!(
    benches,
    bench_direct_lookup,
    bench_grid_lookup,
    bench_gradient,
    bench_grid_build,
    bench_world_step
);
criterion_main!(benches);
