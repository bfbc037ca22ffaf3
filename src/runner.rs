//! Batch driver: steps a [`Simulator`] for a fixed number of steps,
//! optionally exporting statistics and running a concurrent observer.

use chemotaxis_core::Simulator;
use chemotaxis_io::StatsExporter;
use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub steps: u64,
    /// Export a statistics row every this many steps. 0 disables export.
    pub stats_interval: u64,
    /// Spawn a reader thread that polls the world while it steps.
    pub observe: bool,
    pub stop_on_extinction: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            steps: 2000,
            stats_interval: 20,
            observe: false,
            stop_on_extinction: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub time: f64,
    pub organisms: usize,
    pub births: u64,
    pub deaths: u64,
    pub total_energy: f64,
    pub target_energy: f64,
    pub field_rebuilds: u64,
    pub stats_rows: usize,
    pub observer_reads: u64,
    pub extinct: bool,
}

/// Observer poll: copies of both collections plus a point lookup.
fn observe_once(sim: &Simulator) {
    let world = sim.world();
    let organisms = world.organisms();
    let sources = world.chemical_sources();
    let sample_at = organisms
        .first()
        .map(|o| o.position)
        .unwrap_or_else(|| world.bounds().center());
    let c = world.concentration_at(sample_at);
    tracing::trace!(
        organisms = organisms.len(),
        sources = sources.len(),
        concentration = c,
        "Observer poll"
    );
}

/// Runs `options.steps` steps of `sim`.
///
/// A row is exported before the first step and then every
/// `stats_interval` steps. Stops early when the population dies out and
/// `stop_on_extinction` is set.
pub fn run<W: Write>(
    sim: &Simulator,
    options: &RunOptions,
    mut exporter: Option<&mut StatsExporter<W>>,
) -> anyhow::Result<RunSummary> {
    let stop = AtomicBool::new(false);
    let reads = AtomicU64::new(0);
    let mut summary = RunSummary::default();

    std::thread::scope(|scope| -> anyhow::Result<()> {
        if options.observe {
            scope.spawn(|| {
                while !stop.load(Ordering::Relaxed) {
                    observe_once(sim);
                    reads.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(Duration::from_millis(1));
                }
            });
        }

        let result = step_loop(sim, options, &mut exporter, &mut summary);
        stop.store(true, Ordering::Relaxed);
        result
    })?;

    let world = sim.world();
    let (total_energy, target_energy) = world.system_energy_info();
    summary.time = sim.time();
    summary.organisms = world.organism_count();
    summary.births = world.metrics().births();
    summary.deaths = world.metrics().deaths();
    summary.total_energy = total_energy;
    summary.target_energy = target_energy;
    summary.field_rebuilds = world.field_rebuilds();
    summary.observer_reads = reads.load(Ordering::Relaxed);
    summary.stats_rows = exporter.map_or(0, |e| e.rows());
    Ok(summary)
}

fn step_loop<W: Write>(
    sim: &Simulator,
    options: &RunOptions,
    exporter: &mut Option<&mut StatsExporter<W>>,
    summary: &mut RunSummary,
) -> anyhow::Result<()> {
    let export_due = |step: u64| options.stats_interval > 0 && step % options.stats_interval == 0;

    if let Some(out) = exporter.as_deref_mut() {
        if export_due(0) {
            out.write(&sim.collect_stats())?;
        }
    }

    for step in 1..=options.steps {
        let Some(report) = sim.step()? else {
            tracing::warn!(step, "Simulator paused; stopping run");
            break;
        };
        summary.steps = step;

        if let Some(out) = exporter.as_deref_mut() {
            if export_due(step) {
                out.write(&sim.collect_stats())?;
            }
        }

        if report.organisms == 0 {
            summary.extinct = true;
            if options.stop_on_extinction {
                tracing::warn!(step, time = sim.time(), "Population extinct");
                break;
            }
        }
    }
    Ok(())
}
