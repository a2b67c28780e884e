//! Injected capabilities: consistency oracle, diff metric, candidate generator.
//!
//! The core owns none of these. Callers pass them per invocation, either as
//! types implementing the traits or as plain closures with the matching
//! signature.

use crate::error::CapabilityError;

/// Lazy, possibly unbounded candidate sequence. Evaluation order is the
/// iteration order; the tie-break in selection depends on it.
pub type Candidates<'a, S> = Box<dyn Iterator<Item = S> + Send + 'a>;

/// `(s, d) -> {0, 1}`: does `source` correspond to `destination`?
pub trait ConsistencyOracle<S, D>: Sync {
    fn is_consistent(&self, source: &S, destination: &D) -> Result<bool, CapabilityError>;
}

/// `(s', s'') -> real >= 0`. `distance(x, x)` must be 0; symmetry is not required.
pub trait DiffMetric<S>: Sync {
    fn distance(&self, candidate: &S, previous: &S) -> Result<f64, CapabilityError>;
}

/// `(s0, d0, d1) -> sequence of S`: proposes replacement sources for `s0`
/// given that the destination moved from `d0` to `d1`.
pub trait CandidateGenerator<S, D> {
    fn generate<'a>(
        &'a self,
        source: &'a S,
        old_destination: &'a D,
        new_destination: &'a D,
    ) -> Result<Candidates<'a, S>, CapabilityError>
    where
        S: 'a;
}

impl<S, D, F> ConsistencyOracle<S, D> for F
where
    F: Fn(&S, &D) -> Result<bool, CapabilityError> + Sync,
{
    fn is_consistent(&self, source: &S, destination: &D) -> Result<bool, CapabilityError> {
        self(source, destination)
    }
}

impl<S, F> DiffMetric<S> for F
where
    F: Fn(&S, &S) -> Result<f64, CapabilityError> + Sync,
{
    fn distance(&self, candidate: &S, previous: &S) -> Result<f64, CapabilityError> {
        self(candidate, previous)
    }
}

impl<S, D, F> CandidateGenerator<S, D> for F
where
    F: Fn(&S, &D, &D) -> Result<Vec<S>, CapabilityError>,
    S: Send,
{
    fn generate<'a>(
        &'a self,
        source: &'a S,
        old_destination: &'a D,
        new_destination: &'a D,
    ) -> Result<Candidates<'a, S>, CapabilityError>
    where
        S: 'a,
    {
        let candidates = self(source, old_destination, new_destination)?;
        Ok(Box::new(candidates.into_iter()))
    }
}

/// Generator that yields a fixed, pre-ranked list regardless of its inputs.
///
/// Useful when candidates come from outside the process (a batch of model
/// samples, a reviewer's shortlist) and only need ranking.
#[derive(Debug, Clone, Default)]
pub struct FixedCandidates<S> {
    candidates: Vec<S>,
}

impl<S> FixedCandidates<S> {
    pub fn new(candidates: Vec<S>) -> Self {
        Self { candidates }
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl<S> FromIterator<S> for FixedCandidates<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<S, D> CandidateGenerator<S, D> for FixedCandidates<S>
where
    S: Clone + Send + Sync,
{
    fn generate<'a>(
        &'a self,
        _source: &'a S,
        _old_destination: &'a D,
        _new_destination: &'a D,
    ) -> Result<Candidates<'a, S>, CapabilityError>
    where
        S: 'a,
    {
        Ok(Box::new(self.candidates.iter().cloned()))
    }
}

/// Oracle adapter with the argument order reversed, so a `(S, D)` oracle can
/// judge the reverse direction when the source side is the one that changed.
#[derive(Debug)]
pub struct Swapped<'o, O: ?Sized>(pub &'o O);

impl<S, D, O> ConsistencyOracle<D, S> for Swapped<'_, O>
where
    O: ConsistencyOracle<S, D> + ?Sized,
{
    fn is_consistent(&self, destination: &D, source: &S) -> Result<bool, CapabilityError> {
        self.0.is_consistent(source, destination)
    }
}
