use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

use log::{debug, warn};

use crate::cancel::CancelToken;
use crate::capability::{Candidates, ConsistencyOracle, DiffMetric};
use crate::error::ReconcileError;
use crate::model::Evaluation;

/// One evaluated candidate. The candidate value is kept only when it is
/// consistent, since nothing else can win.
#[derive(Debug)]
pub struct Scored<S> {
    pub evaluation: Evaluation,
    pub candidate: Option<S>,
}

/// Evaluate every candidate against `destination`, scoring the consistent
/// ones by distance to `previous`.
///
/// Returns results in generation order regardless of `concurrency`. Any
/// capability failure aborts the run; when several workers fail, the failure
/// with the lowest candidate index is reported.
pub fn evaluate_candidates<S, D, O, M>(
    candidates: Candidates<'_, S>,
    previous: &S,
    destination: &D,
    oracle: &O,
    metric: &M,
    concurrency: usize,
    cancel: &CancelToken,
) -> Result<Vec<Scored<S>>, ReconcileError>
where
    S: Send + Sync,
    D: Sync,
    O: ConsistencyOracle<S, D> + ?Sized,
    M: DiffMetric<S> + ?Sized,
{
    let scored = if concurrency <= 1 {
        evaluate_inline(candidates, previous, destination, oracle, metric, cancel)?
    } else {
        evaluate_pooled(candidates, previous, destination, oracle, metric, concurrency, cancel)?
    };

    // Partial results never leave this function.
    cancel.check()?;
    Ok(scored)
}

fn evaluate_inline<S, D, O, M>(
    candidates: Candidates<'_, S>,
    previous: &S,
    destination: &D,
    oracle: &O,
    metric: &M,
    cancel: &CancelToken,
) -> Result<Vec<Scored<S>>, ReconcileError>
where
    O: ConsistencyOracle<S, D> + ?Sized,
    M: DiffMetric<S> + ?Sized,
{
    let mut scored = Vec::new();
    for (index, candidate) in candidates.enumerate() {
        scored.push(evaluate_one(index, candidate, previous, destination, oracle, metric, cancel)?);
    }
    Ok(scored)
}

fn evaluate_pooled<S, D, O, M>(
    candidates: Candidates<'_, S>,
    previous: &S,
    destination: &D,
    oracle: &O,
    metric: &M,
    concurrency: usize,
    cancel: &CancelToken,
) -> Result<Vec<Scored<S>>, ReconcileError>
where
    S: Send + Sync,
    D: Sync,
    O: ConsistencyOracle<S, D> + ?Sized,
    M: DiffMetric<S> + ?Sized,
{
    let queue = Mutex::new(candidates.enumerate());
    let stop = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(usize, Result<Scored<S>, ReconcileError>)>();

    thread::scope(|scope| {
        for worker in 0..concurrency {
            let tx = tx.clone();
            let queue = &queue;
            let stop = &stop;
            scope.spawn(move || {
                loop {
                    if stop.load(Ordering::SeqCst) || cancel.is_cancelled() {
                        break;
                    }
                    // Pulling from the generator happens under the lock; only
                    // capability calls run in parallel.
                    let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                    let Some((index, candidate)) = next else {
                        break;
                    };
                    let outcome =
                        evaluate_one(index, candidate, previous, destination, oracle, metric, cancel);
                    if outcome.is_err() {
                        stop.store(true, Ordering::SeqCst);
                    }
                    if tx.send((index, outcome)).is_err() {
                        break;
                    }
                }
                debug!("evaluation worker {worker} finished");
            });
        }
    });
    drop(tx);

    let mut scored = Vec::new();
    let mut failure: Option<(usize, ReconcileError)> = None;
    for (index, outcome) in rx {
        match outcome {
            Ok(s) => scored.push(s),
            Err(err) => {
                if failure.as_ref().map_or(true, |(first, _)| index < *first) {
                    failure = Some((index, err));
                }
            }
        }
    }

    if let Some((_, err)) = failure {
        if cancel.is_cancelled() {
            return Err(ReconcileError::Cancelled);
        }
        return Err(err);
    }

    scored.sort_by_key(|s| s.evaluation.index);
    Ok(scored)
}

fn evaluate_one<S, D, O, M>(
    index: usize,
    candidate: S,
    previous: &S,
    destination: &D,
    oracle: &O,
    metric: &M,
    cancel: &CancelToken,
) -> Result<Scored<S>, ReconcileError>
where
    O: ConsistencyOracle<S, D> + ?Sized,
    M: DiffMetric<S> + ?Sized,
{
    cancel.check()?;
    let consistent = oracle.is_consistent(&candidate, destination).map_err(|e| {
        warn!("oracle failed on candidate {index}: {e}");
        ReconcileError::OracleFailure { index, message: e.message }
    })?;

    if !consistent {
        debug!("candidate {index}: inconsistent");
        return Ok(Scored {
            evaluation: Evaluation { index, consistent: false, diff: None },
            candidate: None,
        });
    }

    cancel.check()?;
    let diff = metric.distance(&candidate, previous).map_err(|e| {
        warn!("diff metric failed on candidate {index}: {e}");
        ReconcileError::DiffFailure { index, message: e.message }
    })?;
    if !diff.is_finite() || diff < 0.0 {
        warn!("diff metric returned {diff} for candidate {index}");
        return Err(ReconcileError::DiffFailure {
            index,
            message: format!("metric returned invalid distance {diff}"),
        });
    }

    debug!("candidate {index}: consistent, diff {diff}");
    Ok(Scored {
        evaluation: Evaluation { index, consistent: true, diff: Some(diff) },
        candidate: Some(candidate),
    })
}
