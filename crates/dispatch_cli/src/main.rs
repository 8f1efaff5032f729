//! Command-line front end for the ride dispatch engine.

mod script;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dispatch_core::config::DispatchConfig;
use dispatch_core::engine::DispatchEngine;
use dispatch_core::scenario::{run_scenario, ScenarioParams};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::script::{load_script, ScriptRunner};

#[derive(Parser)]
#[command(
    name = "ride-dispatch",
    about = "Grid-based ride dispatch simulator",
    long_about = "Run scripted dispatch sessions or seeded random scenarios on a\n\
                  tick-driven grid and print the results as JSON."
)]
struct Cli {
    /// JSON file with a DispatchConfig; missing fields keep their defaults
    #[arg(long, global = true, env = "RIDE_DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a JSON command script, printing one JSON result per command
    Run {
        #[arg(long)]
        script: PathBuf,
    },
    /// Run a seeded random scenario and print its summary
    Simulate {
        #[arg(long, default_value_t = 20)]
        drivers: usize,
        #[arg(long, default_value_t = 50)]
        riders: usize,
        #[arg(long, default_value_t = 500)]
        ticks: u64,
        #[arg(long)]
        seed: Option<u64>,
        /// Probability that a driver accepts an offer
        #[arg(long, default_value_t = 0.8)]
        accept_probability: f64,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();
}

fn load_config(path: Option<&Path>) -> Result<DispatchConfig> {
    let Some(path) = path else {
        return Ok(DispatchConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: DispatchConfig = serde_json::from_str(&raw)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("validating config {}", path.display()))?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let config = load_config(cli.config.as_deref())?;
    info!(?config, "configuration loaded");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Commands::Run { script } => {
            let commands = load_script(&script)?;
            let mut runner = ScriptRunner::new(DispatchEngine::new(config)?);
            for result in runner.run_all(&commands) {
                writeln!(out, "{}", serde_json::to_string(&result)?)?;
            }
        }
        Commands::Simulate {
            drivers,
            riders,
            ticks,
            seed,
            accept_probability,
        } => {
            let mut params = ScenarioParams::default()
                .with_drivers(drivers)
                .with_riders(riders)
                .with_ticks(ticks)
                .with_accept_probability(accept_probability);
            if let Some(seed) = seed {
                params = params.with_seed(seed);
            }
            let summary = run_scenario(config, &params).context("running scenario")?;
            writeln!(out, "{}", serde_json::to_string_pretty(&summary)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn partial_config_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(br#"{"max_rejections": 5}"#).expect("write");
        let config = load_config(Some(file.path())).expect("config");
        assert_eq!(config.max_rejections, 5);
        assert_eq!(config.grid_size, DispatchConfig::default().grid_size);
        assert_eq!(
            load_config(None).expect("default"),
            DispatchConfig::default()
        );
    }

    #[test]
    fn config_file_that_fails_validation_is_refused() {
        for raw in [
            r#"{"grid_size": 0}"#,
            r#"{"max_rejections": 0}"#,
            r#"{"weights": {"eta": 2.0}}"#,
        ] {
            let mut file = tempfile::NamedTempFile::new().expect("temp file");
            file.write_all(raw.as_bytes()).expect("write");
            let err = load_config(Some(file.path())).expect_err(raw);
            assert!(
                format!("{err:#}").contains("invalid configuration"),
                "{raw}: {err:#}"
            );
        }
    }
}
