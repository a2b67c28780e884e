//! `mindrift run|validate|prompt`: job-file driven reconciliation.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use mindrift_reconcile::{build_report, reconcile, ReconcileError, Reconciled};

use crate::exit_codes::{reconcile_exit_code, EXIT_ERROR, EXIT_RECON_TOLERANCE, EXIT_USAGE};
use crate::job::Job;
use crate::CliError;

const MANUAL_HINT: &str = "could not reconcile automatically; manual intervention required";

fn run_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn reconcile_err(err: ReconcileError) -> CliError {
    let hint = match err {
        ReconcileError::ConfigParse(_) | ReconcileError::ConfigValidation(_) => {
            "check the job file with `mindrift validate`"
        }
        _ => MANUAL_HINT,
    };
    CliError { code: reconcile_exit_code(&err), message: err.to_string(), hint: Some(hint.to_string()) }
}

fn load_job(path: &Path) -> Result<Job, CliError> {
    let input = std::fs::read_to_string(path)
        .map_err(|e| run_err(EXIT_ERROR, format!("cannot read {}: {e}", path.display())))?;
    Job::from_toml(&input).map_err(reconcile_err)
}

pub fn cmd_run(
    job_path: PathBuf,
    json_output: bool,
    output_file: Option<PathBuf>,
    concurrency: Option<usize>,
    fail_on_tolerance: bool,
) -> Result<(), CliError> {
    let job = load_job(&job_path)?;

    let mut options = job.engine.to_options();
    if let Some(n) = concurrency {
        if n == 0 {
            return Err(run_err(EXIT_USAGE, "--concurrency must be at least 1"));
        }
        options = options.with_concurrency(n);
    }
    debug!(
        "job {}: {} candidates, oracle {}, metric {}",
        job_path.display(),
        job.candidates.len(),
        job.oracle_description(),
        job.metric.as_str(),
    );

    let oracle = job.build_oracle();
    let generator = job.generator();
    let result = reconcile(
        &job.source_element(),
        &job.old_destination_element(),
        &job.new_destination_element(),
        &oracle,
        &job.metric,
        &generator,
        &options,
    )
    .map_err(reconcile_err)?;

    // Output
    let report = build_report(&result, &options);
    let json_str = serde_json::to_string_pretty(&report)
        .map_err(|e| run_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| run_err(EXIT_ERROR, format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    } else {
        println!("{}", result.source);
    }

    print_summary(&result);

    if result.within_tolerance == Some(false) {
        let tolerance = options.tolerance.unwrap_or_default();
        warn!("selected diff {:.4} exceeds tolerance {tolerance:.4}", result.diff);
        if fail_on_tolerance {
            return Err(CliError {
                code: EXIT_RECON_TOLERANCE,
                message: format!("diff {:.4} exceeds tolerance {tolerance:.4}", result.diff),
                hint: Some("review the selected candidate before accepting it".to_string()),
            });
        }
    }

    Ok(())
}

/// Human summary to stderr.
fn print_summary<S>(result: &Reconciled<S>) {
    if result.short_circuit {
        eprintln!("destination unchanged: source kept as is");
        return;
    }
    if let Some(index) = result.selected_index {
        eprintln!(
            "reconciled: candidate {index} of {} ({} consistent), diff {:.4}",
            result.evaluated(),
            result.consistent_count(),
            result.diff,
        );
    }
    if result.within_tolerance == Some(false) {
        eprintln!("tolerance: exceeded");
    }
}

pub fn cmd_validate(job_path: PathBuf) -> Result<(), CliError> {
    let job = load_job(&job_path)?;
    println!(
        "ok: {} candidates, oracle {}, metric {}",
        job.candidates.len(),
        job.oracle_description(),
        job.metric.as_str(),
    );
    Ok(())
}

pub fn cmd_prompt(job_path: PathBuf) -> Result<(), CliError> {
    let job = load_job(&job_path)?;
    let prompt = job.prompt.build().map_err(reconcile_err)?;
    println!("{}", prompt.render(&job.source, &job.old_destination, &job.new_destination));
    Ok(())
}
