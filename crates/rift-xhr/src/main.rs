//! Rift XHR scenario runner CLI
//!
//! Replays the requests of a scenario file against its rules and reports what
//! each request received.
//!
//! Usage:
//!   rift-xhr run <scenario> [--output text|json]
//!   rift-xhr check <scenario>

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use rift_xhr::{run_scenario, Scenario, ScenarioReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Rift XHR scenario runner
#[derive(Parser, Debug)]
#[command(name = "rift-xhr")]
#[command(author, version, about = "Replay request scenarios against simulated responses")]
struct Args {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn", env = "RIFT_XHR_LOG")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario and report each request's outcome
    Run {
        /// Scenario file (YAML or JSON)
        scenario: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Parse and compile a scenario without running it
    Check {
        /// Scenario file (YAML or JSON)
        scenario: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match execute(args.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{RED}error:{RESET} {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether every expectation held.
fn execute(command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Check { scenario } => {
            let loaded = Scenario::from_file(&scenario)?;
            println!(
                "{GREEN}ok{RESET} {} ({} rule(s), {} request(s))",
                scenario.display(),
                loaded.rules.len(),
                loaded.requests.len()
            );
            Ok(true)
        }
        Command::Run { scenario, output } => {
            let loaded = Scenario::from_file(&scenario)?;
            let report = run_scenario(&loaded)
                .with_context(|| format!("failed to run {}", scenario.display()))?;
            match output {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_text(&report),
            }
            Ok(report.passed())
        }
    }
}

fn print_json(report: &ScenarioReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

fn print_text(report: &ScenarioReport) {
    for outcome in &report.outcomes {
        let marker = if outcome.failures.is_empty() {
            format!("{GREEN}✓{RESET}")
        } else {
            format!("{RED}✗{RESET}")
        };
        let rule = match outcome.rule {
            Some(_) if outcome.fallback => "fallback".to_string(),
            Some(id) => format!("rule #{id}"),
            None => "unmatched".to_string(),
        };
        println!(
            "{marker} [{}] {} {} -> {} {DIM}({rule}){RESET}",
            outcome.index, outcome.method, outcome.url, outcome.status
        );
        for failure in &outcome.failures {
            println!("    {RED}{failure}{RESET}");
        }
    }

    let failures = report.failure_count();
    if failures == 0 {
        println!("\n{GREEN}{} request(s), all expectations met{RESET}", report.outcomes.len());
    } else {
        println!("\n{RED}{failures} expectation(s) failed{RESET}");
    }
}
