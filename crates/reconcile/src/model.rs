use std::fmt;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::capability::ConsistencyOracle;
use crate::error::CapabilityError;

// ---------------------------------------------------------------------------
// Elements + pairs
// ---------------------------------------------------------------------------

/// Opaque artifact from either side: text, a code fragment, a serialized
/// image reference. The core never looks inside `payload`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Element {
    pub fn new(payload: impl Into<String>) -> Self {
        Self { payload: payload.into(), domain: None }
    }

    pub fn tagged(payload: impl Into<String>, domain: impl Into<String>) -> Self {
        Self { payload: payload.into(), domain: Some(domain.into()) }
    }
}

impl AsRef<str> for Element {
    fn as_ref(&self) -> &str {
        &self.payload
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.payload)
    }
}

/// Ordered (source, destination) pair with a lazily computed consistency flag.
///
/// The flag is computed on first query and cached until either side is
/// replaced.
#[derive(Debug, Clone)]
pub struct Pair<S, D> {
    source: S,
    destination: D,
    consistent: OnceCell<bool>,
}

impl<S, D> Pair<S, D> {
    pub fn new(source: S, destination: D) -> Self {
        Self { source, destination, consistent: OnceCell::new() }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn destination(&self) -> &D {
        &self.destination
    }

    pub fn set_source(&mut self, source: S) {
        self.source = source;
        self.consistent = OnceCell::new();
    }

    pub fn set_destination(&mut self, destination: D) {
        self.destination = destination;
        self.consistent = OnceCell::new();
    }

    /// Replace both sides at once with a consistency verdict that is already
    /// known (e.g. just confirmed by the oracle during reconciliation).
    pub fn replace(&mut self, source: S, destination: D, consistent: bool) {
        self.source = source;
        self.destination = destination;
        self.consistent = OnceCell::with_value(consistent);
    }

    /// Cached verdict, if one has been computed since the last change.
    pub fn cached_consistency(&self) -> Option<bool> {
        self.consistent.get().copied()
    }

    pub fn is_consistent<O>(&self, oracle: &O) -> Result<bool, CapabilityError>
    where
        O: ConsistencyOracle<S, D> + ?Sized,
    {
        self.consistent
            .get_or_try_init(|| oracle.is_consistent(&self.source, &self.destination))
            .copied()
    }

    pub fn into_parts(self) -> (S, D) {
        (self.source, self.destination)
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-invocation knobs. Built directly or from [`crate::ReconcileConfig`].
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Worker threads for candidate evaluation. 1 = evaluate inline.
    pub concurrency: usize,
    /// Top-K cut on the generated sequence.
    pub max_candidates: Option<usize>,
    /// Sanity bound on the winning diff. Reported, never enforced.
    pub tolerance: Option<f64>,
    /// Evaluate the previous source as candidate 0 ahead of generated ones.
    pub include_source: bool,
    /// Wall-clock budget, measured from the start of the call.
    pub deadline: Option<Duration>,
    pub cancel: CancelToken,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            max_candidates: None,
            tolerance: None,
            include_source: false,
            deadline: None,
            cancel: CancelToken::new(),
        }
    }
}

impl ReconcileOptions {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_max_candidates(mut self, limit: usize) -> Self {
        self.max_candidates = Some(limit);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_source_included(mut self) -> Self {
        self.include_source = true;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

// ---------------------------------------------------------------------------
// Evaluation + result
// ---------------------------------------------------------------------------

/// Verdict for one candidate. `index` is the generation index; `diff` is only
/// computed for consistent candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub index: usize,
    pub consistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<f64>,
}

/// Successful reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciled<S> {
    pub source: S,
    /// Generation index of the winner. `None` when the call short-circuited.
    pub selected_index: Option<usize>,
    pub diff: f64,
    /// The destination did not change; no capability was invoked.
    pub short_circuit: bool,
    /// `Some(diff <= tolerance)` when a tolerance was supplied.
    pub within_tolerance: Option<bool>,
    /// Every evaluated candidate, in generation order.
    pub evaluations: Vec<Evaluation>,
}

impl<S> Reconciled<S> {
    pub(crate) fn unchanged(source: S) -> Self {
        Self {
            source,
            selected_index: None,
            diff: 0.0,
            short_circuit: true,
            within_tolerance: None,
            evaluations: Vec::new(),
        }
    }

    pub fn evaluated(&self) -> usize {
        self.evaluations.len()
    }

    pub fn consistent_count(&self) -> usize {
        self.evaluations.iter().filter(|e| e.consistent).count()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconcileSummary {
    pub evaluated: usize,
    pub consistent: usize,
    pub inconsistent: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_index: Option<usize>,
    pub selected_diff: f64,
    pub short_circuit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_tolerance: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub engine_version: String,
    pub run_at: String,
    pub concurrency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

/// Serializable record of one reconciliation: what won, and how every
/// candidate fared.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport<S> {
    pub meta: ReportMeta,
    pub summary: ReconcileSummary,
    pub selected: S,
    /// Consistent candidates, best first.
    pub ranking: Vec<Evaluation>,
    pub evaluations: Vec<Evaluation>,
}
