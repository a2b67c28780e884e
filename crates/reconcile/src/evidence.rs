use serde::Serialize;

use crate::model::{Evaluation, ReconcileOptions, ReconcileReport, ReconcileSummary, Reconciled, ReportMeta};
use crate::select::rank;

/// Compute summary statistics from a reconciliation result.
pub fn compute_summary<S>(result: &Reconciled<S>) -> ReconcileSummary {
    let consistent = result.consistent_count();
    ReconcileSummary {
        evaluated: result.evaluated(),
        consistent,
        inconsistent: result.evaluated() - consistent,
        selected_index: result.selected_index,
        selected_diff: result.diff,
        short_circuit: result.short_circuit,
        within_tolerance: result.within_tolerance,
    }
}

/// Serializable report for a finished reconciliation.
pub fn build_report<S>(result: &Reconciled<S>, options: &ReconcileOptions) -> ReconcileReport<S>
where
    S: Clone + Serialize,
{
    let ranking: Vec<Evaluation> = rank(&result.evaluations);
    ReconcileReport {
        meta: ReportMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            concurrency: options.concurrency,
            tolerance: options.tolerance,
        },
        summary: compute_summary(result),
        selected: result.source.clone(),
        ranking,
        evaluations: result.evaluations.clone(),
    }
}
