// mindrift CLI - minimal-drift reconciliation from TOML job files

mod exit_codes;
mod job;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};
use job::MetricKind;

#[derive(Parser)]
#[command(name = "mindrift")]
#[command(about = "Keep paired artifacts consistent with the smallest possible edit")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Increase log output (-v info, -vv debug); overrides --log
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log filter directives, e.g. `warn` or `mindrift_reconcile=debug`
    #[arg(long, env = "MINDRIFT_LOG", global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the source against an edited destination
    #[command(after_help = "\
Examples:
  mindrift run job.toml
  mindrift run job.toml --json
  mindrift run job.toml --output report.json --concurrency 4
  mindrift run job.toml --fail-on-tolerance")]
    Run {
        /// Path to the job file
        job: PathBuf,

        /// Output the JSON report to stdout instead of the selected source
        #[arg(long)]
        json: bool,

        /// Write the JSON report to file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Worker threads for candidate evaluation (overrides engine.concurrency)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Exit with an error when the selected diff exceeds engine.tolerance
        #[arg(long)]
        fail_on_tolerance: bool,
    },

    /// Validate a job file without running it
    #[command(after_help = "\
Examples:
  mindrift validate job.toml")]
    Validate {
        /// Path to the job file
        job: PathBuf,
    },

    /// Print the normalized distance between two texts
    #[command(after_help = "\
Examples:
  mindrift distance kitten sitting
  mindrift distance 'use UUID' 'use UUID v4' --metric word")]
    Distance {
        a: String,
        b: String,

        #[arg(long, value_enum, default_value = "char")]
        metric: MetricKind,
    },

    /// Render the delta prompt for a job's destination edit
    #[command(after_help = "\
Examples:
  mindrift prompt job.toml")]
    Prompt {
        /// Path to the job file
        job: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(log_filter(cli.verbose, cli.log.as_deref()));

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: mindrift <command> [options]");
            eprintln!("       mindrift --help for more information");
            Err(CliError::args(""))
        }
        Some(Commands::Run { job, json, output, concurrency, fail_on_tolerance }) => {
            run::cmd_run(job, json, output, concurrency, fail_on_tolerance)
        }
        Some(Commands::Validate { job }) => run::cmd_validate(job),
        Some(Commands::Distance { a, b, metric }) => cmd_distance(&a, &b, metric),
        Some(Commands::Prompt { job }) => run::cmd_prompt(job),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// `-v`/`-vv` win over `--log`/`MINDRIFT_LOG`; the default is `warn`.
fn log_filter(verbose: u8, directives: Option<&str>) -> EnvFilter {
    let fallback = || EnvFilter::new("warn");
    match verbose {
        0 => directives
            .map(|d| EnvFilter::try_new(d).unwrap_or_else(|_| fallback()))
            .unwrap_or_else(fallback),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    }
}

/// Records from the `log` facade are bridged into the subscriber.
fn init_logging(filter: EnvFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("MINDRIFT_COMMIT"), ")",
        "\ntarget:  ", env!("MINDRIFT_TARGET"),
        "\nreport:  ReconcileReport v1",
    )
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }
}

fn cmd_distance(a: &str, b: &str, metric: MetricKind) -> Result<(), CliError> {
    println!("{:.4}", metric.between(a, b));
    Ok(())
}
