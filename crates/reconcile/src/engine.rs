use std::iter;
use std::time::Instant;

use log::{debug, info, warn};

use crate::capability::{CandidateGenerator, Candidates, ConsistencyOracle, DiffMetric};
use crate::error::ReconcileError;
use crate::evaluate::evaluate_candidates;
use crate::model::{Evaluation, ReconcileOptions, Reconciled};
use crate::select::select_minimal;

/// Find the new source for `new_destination` that drifts least from
/// `source`.
///
/// `(source, old_destination)` is trusted to have been consistent; it is not
/// re-checked. When the destination did not change the call is a no-op that
/// returns `source` without touching any capability.
pub fn reconcile<S, D, O, M, G>(
    source: &S,
    old_destination: &D,
    new_destination: &D,
    oracle: &O,
    metric: &M,
    generator: &G,
    options: &ReconcileOptions,
) -> Result<Reconciled<S>, ReconcileError>
where
    S: Clone + Send + Sync,
    D: PartialEq + Sync,
    O: ConsistencyOracle<S, D> + ?Sized,
    M: DiffMetric<S> + ?Sized,
    G: CandidateGenerator<S, D> + ?Sized,
{
    if new_destination == old_destination {
        debug!("destination unchanged; keeping source");
        return Ok(Reconciled::unchanged(source.clone()));
    }

    let cancel = match options.deadline {
        Some(budget) => options.cancel.until(Instant::now() + budget),
        None => options.cancel.clone(),
    };
    cancel.check()?;

    let generated = generator
        .generate(source, old_destination, new_destination)
        .map_err(|e| {
            warn!("candidate generator failed: {e}");
            ReconcileError::GeneratorFailure(e.message)
        })?;

    let mut candidates: Candidates<'_, S> = if options.include_source {
        Box::new(iter::once(source.clone()).chain(generated))
    } else {
        generated
    };
    if let Some(limit) = options.max_candidates {
        candidates = Box::new(candidates.take(limit));
    }

    let scored = evaluate_candidates(
        candidates,
        source,
        new_destination,
        oracle,
        metric,
        options.concurrency,
        &cancel,
    )?;

    if scored.is_empty() {
        warn!("candidate generator produced nothing");
        return Err(ReconcileError::EmptyCandidateSet);
    }

    let evaluations: Vec<Evaluation> = scored.iter().map(|s| s.evaluation).collect();
    let winner = select_minimal(
        scored
            .into_iter()
            .filter_map(|s| s.candidate.map(|candidate| (s.evaluation, candidate))),
    );

    let Some((evaluation, selected)) = winner else {
        warn!("none of {} candidate(s) is consistent", evaluations.len());
        return Err(ReconcileError::NoConsistentCandidate { evaluated: evaluations.len() });
    };

    let diff = evaluation.diff.unwrap_or_default();
    let within_tolerance = options.tolerance.map(|tolerance| diff <= tolerance);
    if within_tolerance == Some(false) {
        warn!("selected candidate {} drifts {diff}, above tolerance", evaluation.index);
    }

    info!(
        "selected candidate {} of {} (diff {diff}, {} consistent)",
        evaluation.index,
        evaluations.len(),
        evaluations.iter().filter(|e| e.consistent).count(),
    );

    Ok(Reconciled {
        source: selected,
        selected_index: Some(evaluation.index),
        diff,
        short_circuit: false,
        within_tolerance,
        evaluations,
    })
}
