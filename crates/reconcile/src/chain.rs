//! Keeping a pair aligned across a sequence of edits.

use std::fmt;

use log::info;
use serde::Serialize;

use crate::capability::{CandidateGenerator, ConsistencyOracle, DiffMetric, Swapped};
use crate::engine::reconcile;
use crate::error::{CapabilityError, ReconcileError};
use crate::model::{Pair, ReconcileOptions, Reconciled};

/// Which side the caller edited. The other side is the one re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditedSide {
    Source,
    Destination,
}

/// One committed edit and the drift it cost on the re-derived side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftStep {
    pub step: usize,
    pub edited: EditedSide,
    pub diff: f64,
    pub short_circuit: bool,
}

/// A source/destination pair under incremental change.
///
/// Edits are applied one at a time through `&mut self`, so there is a single
/// writer per pair. A failed reconciliation leaves the pair untouched.
#[derive(Debug, Clone)]
pub struct TrackedPair<S, D> {
    pair: Pair<S, D>,
    history: Vec<DriftStep>,
}

impl<S, D> TrackedPair<S, D>
where
    S: Clone + PartialEq + Send + Sync,
    D: Clone + PartialEq + Send + Sync,
{
    /// Start tracking an aligned pair. Alignment is the caller's claim and is
    /// not re-checked here.
    pub fn new(source: S, destination: D) -> Self {
        Self { pair: Pair::new(source, destination), history: Vec::new() }
    }

    pub fn source(&self) -> &S {
        self.pair.source()
    }

    pub fn destination(&self) -> &D {
        self.pair.destination()
    }

    pub fn is_consistent<O>(&self, oracle: &O) -> Result<bool, CapabilityError>
    where
        O: ConsistencyOracle<S, D> + ?Sized,
    {
        self.pair.is_consistent(oracle)
    }

    pub fn history(&self) -> &[DriftStep] {
        &self.history
    }

    /// Sum of per-step diffs: how far the re-derived sides have moved in total.
    pub fn total_drift(&self) -> f64 {
        self.history.iter().map(|s| s.diff).sum()
    }

    /// The destination changed: re-derive the source.
    pub fn update_destination<O, M, G>(
        &mut self,
        new_destination: D,
        oracle: &O,
        metric: &M,
        generator: &G,
        options: &ReconcileOptions,
    ) -> Result<DriftStep, ReconcileError>
    where
        O: ConsistencyOracle<S, D> + ?Sized,
        M: DiffMetric<S> + ?Sized,
        G: CandidateGenerator<S, D> + ?Sized,
    {
        let result = reconcile(
            self.pair.source(),
            self.pair.destination(),
            &new_destination,
            oracle,
            metric,
            generator,
            options,
        )?;
        let short_circuit = result.short_circuit;
        let diff = result.diff;
        if !short_circuit {
            self.pair.replace(result.source, new_destination, true);
        }
        Ok(self.record(EditedSide::Destination, diff, short_circuit))
    }

    /// The source changed: re-derive the destination with the roles swapped.
    /// The oracle keeps its `(source, destination)` argument order.
    pub fn update_source<O, M, G>(
        &mut self,
        new_source: S,
        oracle: &O,
        metric: &M,
        generator: &G,
        options: &ReconcileOptions,
    ) -> Result<DriftStep, ReconcileError>
    where
        O: ConsistencyOracle<S, D> + ?Sized,
        M: DiffMetric<D> + ?Sized,
        G: CandidateGenerator<D, S> + ?Sized,
    {
        let swapped = Swapped(oracle);
        let result = reconcile(
            self.pair.destination(),
            self.pair.source(),
            &new_source,
            &swapped,
            metric,
            generator,
            options,
        )?;
        let short_circuit = result.short_circuit;
        let diff = result.diff;
        if !short_circuit {
            self.pair.replace(new_source, result.source, true);
        }
        Ok(self.record(EditedSide::Source, diff, short_circuit))
    }

    fn record(&mut self, edited: EditedSide, diff: f64, short_circuit: bool) -> DriftStep {
        let step = DriftStep { step: self.history.len() + 1, edited, diff, short_circuit };
        info!("step {}: {:?} edited, drift {diff}", step.step, edited);
        self.history.push(step);
        step
    }

    pub fn into_pair(self) -> Pair<S, D> {
        self.pair
    }
}

/// A chained reconciliation stopped at `step` (1-based).
#[derive(Debug, Clone, PartialEq)]
pub struct ChainError {
    pub step: usize,
    pub error: ReconcileError,
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {}: {}", self.step, self.error)
    }
}

impl std::error::Error for ChainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Apply destination edits `d0 -> d1 -> d2 -> ...` in order, each using the
/// previous result as the new source. Returns one result per edit.
pub fn reconcile_chain<S, D, O, M, G>(
    source: S,
    destination: D,
    edits: impl IntoIterator<Item = D>,
    oracle: &O,
    metric: &M,
    generator: &G,
    options: &ReconcileOptions,
) -> Result<Vec<Reconciled<S>>, ChainError>
where
    S: Clone + Send + Sync,
    D: PartialEq + Sync,
    O: ConsistencyOracle<S, D> + ?Sized,
    M: DiffMetric<S> + ?Sized,
    G: CandidateGenerator<S, D> + ?Sized,
{
    let mut current_source = source;
    let mut current_destination = destination;
    let mut results = Vec::new();

    for (i, next_destination) in edits.into_iter().enumerate() {
        let result = reconcile(
            &current_source,
            &current_destination,
            &next_destination,
            oracle,
            metric,
            generator,
            options,
        )
        .map_err(|error| ChainError { step: i + 1, error })?;
        current_source = result.source.clone();
        current_destination = next_destination;
        results.push(result);
    }

    Ok(results)
}
