// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use storage_contracts::BoardSupport;
use storage_testing::runner;
use storage_testing::scenario;
use storage_testing::sim::{ProbeWiring, SimBoard};
use storage_types::PlatformConfig;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "storage-lab")]
#[command(about = "Run storage lifecycle scenarios against a simulated board")]
struct LabCli {
    #[command(subcommand)]
    command: LabCommand,
}

#[derive(Debug, Subcommand)]
enum LabCommand {
    /// Execute scenarios and report each step
    Run {
        names: Vec<String>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Parse and validate scenarios without running them
    Check {
        names: Vec<String>,
        #[arg(long)]
        all: bool,
    },
    /// List scenario names
    List,
    /// Run board detection on a simulated probe pin
    Detect {
        #[arg(long, value_enum, default_value = "floating")]
        wiring: Wiring,
        /// Platform config TOML; defaults to the embedded-OS preset
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Wiring {
    Floating,
    PulledUp,
    Absent,
}

impl From<Wiring> for ProbeWiring {
    fn from(value: Wiring) -> Self {
        match value {
            Wiring::Floating => ProbeWiring::Floating,
            Wiring::PulledUp => ProbeWiring::PulledUp,
            Wiring::Absent => ProbeWiring::Absent,
        }
    }
}

fn selected(names: Vec<String>, all: bool) -> Result<Vec<String>> {
    if all {
        return Ok(scenario::list_names()?);
    }
    if names.is_empty() {
        bail!("name at least one scenario, or pass --all");
    }
    Ok(names)
}

fn run(names: Vec<String>, all: bool, json: bool) -> Result<()> {
    let mut failed = Vec::new();

    for name in selected(names, all)? {
        let loaded = scenario::load_by_name(&name)?;
        let report = runner::run(&loaded)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("{}", report.scenario);
            for step in &report.steps {
                println!("  {}", step);
            }
        }

        if !report.passed() {
            failed.push(name);
        }
    }

    if !failed.is_empty() {
        bail!("failed scenarios: {}", failed.join(", "));
    }
    Ok(())
}

fn check(names: Vec<String>, all: bool) -> Result<()> {
    for name in selected(names, all)? {
        let loaded = scenario::load_by_name(&name)?;
        println!("{}: {} steps", loaded.name, loaded.steps.len());
    }
    Ok(())
}

fn detect(wiring: Wiring, config: Option<PathBuf>) -> Result<()> {
    let config = match config {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            PlatformConfig::from_toml_str(&raw)?
        }
        None => PlatformConfig::embedded_os_host(),
    };

    let mut board = SimBoard::new(&config);
    let sim = board.handle();
    sim.set_wiring(wiring.into());

    let variant = storage_sys::detect_board(&config, board.probe_hardware());
    let (rounds, elapsed_ns) = sim.with(|state| (state.probe_runs, state.elapsed_ns));
    println!("variant: {:?}", variant);
    println!("probe rounds: {}, simulated time: {} us", rounds, elapsed_ns / 1_000);
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storage_lab=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = LabCli::parse();
    match cli.command {
        LabCommand::Run { names, all, json } => run(names, all, json),
        LabCommand::Check { names, all } => check(names, all),
        LabCommand::List => {
            for name in scenario::list_names()? {
                println!("{}", name);
            }
            Ok(())
        }
        LabCommand::Detect { wiring, config } => detect(wiring, config),
    }
}
