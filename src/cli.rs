use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::report::ReportFormat;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the bench and render a live status board at the end.
    Run(RunArgs),

    /// Run the bench and export the session report.
    Export(ExportArgs),

    /// Validate a fleet config and print the resolved cell parameters.
    Check(CheckArgs),
}

#[derive(Parser)]
pub struct SimulationArgs {
    /// Fleet configuration file.
    #[clap(long, env = "FLEET_CONFIG", default_value = "fleet.toml")]
    pub config: PathBuf,

    /// Number of simulation ticks to drive.
    #[clap(long, default_value = "60")]
    pub ticks: u32,

    /// Simulated wall-clock distance between ticks.
    #[clap(long = "tick-interval-ms", default_value = "1000", env = "TICK_INTERVAL_MS")]
    pub tick_interval_ms: i64,

    /// Seed for the telemetry random walk; omit for a fresh run.
    #[clap(long, env = "TELEMETRY_SEED")]
    pub seed: Option<u64>,
}

#[derive(Parser)]
pub struct RunArgs {
    #[clap(flatten)]
    pub simulation: SimulationArgs,
}

#[derive(Parser)]
pub struct ExportArgs {
    #[clap(flatten)]
    pub simulation: SimulationArgs,

    #[clap(long, value_enum, default_value = "json")]
    pub format: ReportFormat,

    /// Write the report here instead of standard output.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CheckArgs {
    /// Fleet configuration file.
    #[clap(long, env = "FLEET_CONFIG", default_value = "fleet.toml")]
    pub config: PathBuf,
}
