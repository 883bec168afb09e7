mod cli;
mod config;
mod core;
mod prelude;
mod quantity;
mod report;
mod tables;

use chrono::TimeDelta;
use clap::Parser;

use crate::{
    cli::{Args, CheckArgs, Command, ExportArgs, RunArgs, SimulationArgs},
    config::FleetConfig,
    core::{Mode, SystemState, TelemetryGenerator},
    prelude::*,
    report::Report,
    tables::{build_alerts_table, build_status_table},
};

fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();

    match Args::parse().command {
        Command::Run(args) => run(&args),
        Command::Export(args) => export(&args),
        Command::Check(args) => check(&args),
    }
}

fn run(args: &RunArgs) -> Result {
    let state = simulate(&args.simulation)?;
    let snapshot = state.snapshot();
    println!("{}", build_status_table(&snapshot));
    if snapshot.alerts.is_empty() {
        info!("all cells nominal");
    } else {
        println!("{}", build_alerts_table(&snapshot.alerts));
    }
    match state.mode() {
        Mode::EmergencyStopped => {
            warn!(reason = state.stop_reason().unwrap_or("unknown"), "bench is emergency-stopped");
        }
        mode => info!(?mode, "finished"),
    }
    Ok(())
}

fn export(args: &ExportArgs) -> Result {
    let state = simulate(&args.simulation)?;
    let rendered = Report::from_state(&state).render(args.format)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write the report to `{}`", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn check(args: &CheckArgs) -> Result {
    let fleet = FleetConfig::load(&args.config)?;
    let cells = fleet.build_cells()?;
    for cell in &cells {
        let config = cell.config();
        info!(
            id = cell.id(),
            chemistry = %config.chemistry,
            nominal_voltage = %config.nominal_voltage,
            rated_capacity = %config.rated_capacity,
            max_charge_current = %config.max_charge_current,
            max_discharge_current = %config.max_discharge_current,
            "resolved",
        );
    }
    info!(n_cells = cells.len(), "the fleet config is valid");
    Ok(())
}

/// Drives the bench for the requested number of ticks, stopping early if a
/// critical alert trips the emergency stop.
fn simulate(args: &SimulationArgs) -> Result<SystemState> {
    let fleet = FleetConfig::load(&args.config)?;
    let mut state = SystemState::builder()
        .bench_name(fleet.bench_name.clone())
        .group_number(fleet.group_number)
        .cells(fleet.build_cells()?)
        .build();
    let mut generator = TelemetryGenerator::builder()
        .maybe_seed(args.seed)
        .tick_interval(TimeDelta::milliseconds(args.tick_interval_ms))
        .build();

    state.start()?;
    for n in 0..args.ticks {
        state.tick(&mut generator)?;
        if state.mode() != Mode::Running {
            warn!(tick = n, "the bench stopped mid-run");
            break;
        }
    }
    if state.mode() == Mode::Running {
        state.pause()?;
    }
    Ok(state)
}
