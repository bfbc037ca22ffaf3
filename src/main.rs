use anyhow::{Context, Result};
use chemotaxis_core::{init_logging, AppConfig, Simulator};
use chemotaxis_io::{load_config, StatsExporter, StatsFormat};
use chemotaxis_lib::runner::{self, RunOptions};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (.toml or .json); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of fixed steps to run
    #[arg(short, long, default_value_t = 2000)]
    steps: u64,

    /// Overrides the configured world seed
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation speed multiplier (clamped to the configured range)
    #[arg(long)]
    speed: Option<f64>,

    /// Write statistics to this file
    #[arg(long)]
    stats_out: Option<PathBuf>,

    /// csv, json or jsonl; inferred from --stats-out when omitted
    #[arg(long)]
    stats_format: Option<StatsFormat>,

    /// Steps between statistics rows
    #[arg(long, default_value_t = 20)]
    stats_interval: u64,

    /// Poll the world from a second thread while stepping
    #[arg(long)]
    observe: bool,

    /// Keep stepping after the population dies out
    #[arg(long)]
    keep_going: bool,
}

fn main() -> Result<()> {
    init_logging("chemotaxis=info");

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = Some(seed);
    }

    let sim = Simulator::new(config)?;
    if let Some(speed) = args.speed {
        let applied = sim.set_simulation_speed(speed);
        if applied != speed {
            tracing::warn!(requested = speed, applied, "Speed clamped");
        }
    }

    let options = RunOptions {
        steps: args.steps,
        stats_interval: args.stats_interval,
        observe: args.observe,
        stop_on_extinction: !args.keep_going,
    };

    let summary = match &args.stats_out {
        Some(path) => {
            let format = match args.stats_format {
                Some(format) => format,
                None => StatsFormat::from_path(path)?,
            };
            let mut exporter = StatsExporter::create(path, format)?;
            let summary = runner::run(&sim, &options, Some(&mut exporter))?;
            exporter.finish()?;
            summary
        }
        None => runner::run::<std::io::Sink>(&sim, &options, None)?,
    };

    tracing::info!(
        steps = summary.steps,
        time = summary.time,
        organisms = summary.organisms,
        births = summary.births,
        deaths = summary.deaths,
        "Run finished"
    );
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
