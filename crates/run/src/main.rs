//! natal-run - runs a scenario batch and writes the result table
//!
//! This binary loads a baseline configuration (JSON, or the built-in
//! illustrative one), reads a scenario file, runs every scenario against
//! the projection engine with the requested repeat count, and writes the
//! collected table to CSV.

use std::path::PathBuf;

use clap::Parser;
use natal_core::{defaults, ModelConfig};
use natal_projection::ProjectionEngine;
use natal_scenarios::{ScenarioDef, ScenarioSet};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "natal-run")]
#[command(about = "Run family-planning scenarios against a baseline")]
struct Cli {
    /// Path to a scenario file: a JSON array of scenario definitions
    scenarios: PathBuf,

    /// Path to a baseline configuration (JSON); the built-in illustrative
    /// baseline when omitted
    #[arg(long)]
    baseline: Option<PathBuf>,

    /// Independent repeats per scenario
    #[arg(long, default_value = "1")]
    repeats: u32,

    /// Where to write the result table
    #[arg(long, default_value = "results.csv")]
    out: PathBuf,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "natal_run=info,natal_scenarios=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let baseline: ModelConfig = match &cli.baseline {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => defaults::baseline(),
    };
    info!(
        baseline = baseline.name.as_str(),
        start = baseline.start_year,
        end = baseline.end_year,
        "baseline loaded"
    );

    let defs: Vec<ScenarioDef> = serde_json::from_str(&std::fs::read_to_string(&cli.scenarios)?)?;
    let mut set = ScenarioSet::new(baseline, cli.repeats)?;
    for def in defs {
        set.add(def.build()?)?;
    }
    info!(scenarios = set.len(), repeats = set.repeats(), "batch ready");

    let report = set.run(&ProjectionEngine)?;
    report.results.to_csv_path(&cli.out)?;
    info!(
        rows = report.results.len(),
        out = %cli.out.display(),
        "results written"
    );
    if !report.is_complete() {
        warn!(failures = report.failures.len(), "some runs did not complete");
    }
    Ok(())
}
