use std::path::Path;
use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the ride dispatch workspace",
    long_about = "A unified CLI for running dispatch scripts, seeded scenarios,\n\
                  tests, benchmarks, and CI checks in the ride dispatch workspace."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command script (defaults to the single-ride demo)
    Run {
        #[arg(long, default_value = "demos/single_ride.json")]
        script: String,
    },
    /// Run a seeded random scenario
    Simulate {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 20)]
        drivers: usize,
        #[arg(long, default_value_t = 50)]
        riders: usize,
        #[arg(long, default_value_t = 500)]
        ticks: u64,
    },
    /// Run the workspace test suite
    Test,
    /// Run Criterion benchmarks
    Bench,
    /// Compare benchmarks: stash changes, create baseline, restore, compare
    BenchCompare,
    /// Run CI checks (fmt, clippy, tests, demos, benchmarks)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Run the demo scripts and a seeded scenario
    Demos,
    /// Run benchmarks
    Bench,
    /// Run check + demos + bench
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn spawn(program: &str, args: &[&str]) -> ExitStatus {
    eprintln!("+ {program} {}", args.join(" "));
    match Command::new(program).args(args).status() {
        Ok(status) => status,
        Err(error) => {
            eprintln!("failed to execute {program}: {error}");
            exit(1);
        }
    }
}

fn run(program: &str, args: &[&str]) {
    let status = spawn(program, args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_cargo(args: &[&str]) {
    run("cargo", args);
}

fn run_dispatch(args: &[&str]) {
    let mut full = vec!["run", "-p", "dispatch_cli", "--release", "--"];
    full.extend_from_slice(args);
    run_cargo(&full);
}

fn bench(extra: &[&str]) {
    let mut args = vec!["bench", "--package", "dispatch_core", "--bench", "performance"];
    if !extra.is_empty() {
        args.push("--");
        args.extend_from_slice(extra);
    }
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test dispatch_core");
    run_cargo(&["test", "-p", "dispatch_core"]);

    step("Test dispatch_cli");
    run_cargo(&["test", "-p", "dispatch_cli"]);
}

fn ci_demos() {
    for script in ["demos/single_ride.json", "demos/rejection_fallback.json"] {
        step(&format!("Run {script}"));
        run_dispatch(&["run", "--script", script]);
    }

    step("Run seeded scenario");
    run_dispatch(&["simulate", "--seed", "42"]);
}

fn ci_bench() {
    step("Run benchmarks");
    bench(&[]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { script } => {
            run_dispatch(&["run", "--script", &script]);
        }
        Commands::Simulate {
            seed,
            drivers,
            riders,
            ticks,
        } => {
            let (seed, drivers, riders, ticks) = (
                seed.to_string(),
                drivers.to_string(),
                riders.to_string(),
                ticks.to_string(),
            );
            run_dispatch(&[
                "simulate",
                "--seed",
                &seed,
                "--drivers",
                &drivers,
                "--riders",
                &riders,
                "--ticks",
                &ticks,
            ]);
        }
        Commands::Test => {
            run_cargo(&["test", "--workspace"]);
        }
        Commands::Bench => bench(&[]),
        Commands::BenchCompare => {
            let baseline_dir = Path::new("target/criterion");
            if baseline_dir.exists() {
                step("Removing existing benchmark data");
                if let Err(error) = std::fs::remove_dir_all(baseline_dir) {
                    eprintln!("failed to remove target/criterion: {error}");
                    exit(1);
                }
            }

            step("Stashing current changes");
            run(
                "git",
                &["stash", "push", "-m", "Temporary stash for benchmark comparison"],
            );

            step("Running benchmark to create baseline");
            bench(&["--save-baseline", "main"]);

            step("Reapplying changes");
            run("git", &["stash", "pop"]);

            step("Running benchmark comparing against baseline");
            bench(&["--baseline", "main"]);

            eprintln!("\nDone! Check the output above to see performance comparison.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Demos => ci_demos(),
                CiJob::Bench => ci_bench(),
                CiJob::All => {
                    ci_check();
                    ci_demos();
                    ci_bench();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
