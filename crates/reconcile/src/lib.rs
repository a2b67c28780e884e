//! `mindrift-reconcile`: minimal-drift reconciliation of correlated artifacts.
//!
//! Two artifacts (a source and a destination: a text and its translation,
//! code and its comments, an image and its prompt) must stay consistent.
//! When one side changes, [`reconcile`] picks, among candidate replacements
//! for the other side, the consistent one closest to its previous value.
//!
//! Pure engine crate: consistency, distance and candidate generation are
//! injected capabilities. No CLI or IO dependencies.

pub mod cancel;
pub mod capability;
pub mod chain;
pub mod config;
pub mod delta;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod evidence;
pub mod model;
pub mod prompt;
pub mod select;
pub mod text;

pub use cancel::CancelToken;
pub use capability::{CandidateGenerator, Candidates, ConsistencyOracle, DiffMetric, FixedCandidates};
pub use chain::{reconcile_chain, TrackedPair};
pub use config::ReconcileConfig;
pub use engine::reconcile;
pub use error::{CapabilityError, ReconcileError};
pub use evidence::build_report;
pub use model::{Element, Evaluation, Pair, ReconcileOptions, ReconcileReport, Reconciled};
