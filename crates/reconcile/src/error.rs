use std::fmt;

/// Failure raised by an injected capability (oracle, metric, generator).
///
/// The core never retries; wrappers that talk to flaky backends own their
/// own retry policy and only surface the final failure here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityError {
    pub message: String,
}

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CapabilityError {}

impl From<String> for CapabilityError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for CapabilityError {
    fn from(message: &str) -> Self {
        Self { message: message.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileError {
    /// The generator produced zero candidates.
    EmptyCandidateSet,
    /// Candidates existed but none satisfied the oracle.
    NoConsistentCandidate { evaluated: usize },
    /// Caller cancellation or deadline fired mid-evaluation.
    Cancelled,
    /// The consistency oracle failed on the candidate at `index`.
    OracleFailure { index: usize, message: String },
    /// The diff metric failed (or returned a negative / non-finite distance).
    DiffFailure { index: usize, message: String },
    /// The candidate generator itself failed.
    GeneratorFailure(String),
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (zero concurrency, negative tolerance, etc.).
    ConfigValidation(String),
}

impl ReconcileError {
    /// Stable snake_case identifier, used in JSON output and exit-code mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyCandidateSet => "empty_candidate_set",
            Self::NoConsistentCandidate { .. } => "no_consistent_candidate",
            Self::Cancelled => "cancelled",
            Self::OracleFailure { .. } => "oracle_failure",
            Self::DiffFailure { .. } => "diff_failure",
            Self::GeneratorFailure(_) => "generator_failure",
            Self::ConfigParse(_) => "config_parse",
            Self::ConfigValidation(_) => "config_validation",
        }
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCandidateSet => write!(f, "candidate generator produced no candidates"),
            Self::NoConsistentCandidate { evaluated } => {
                write!(f, "none of {evaluated} candidate(s) is consistent with the new destination")
            }
            Self::Cancelled => write!(f, "reconciliation cancelled"),
            Self::OracleFailure { index, message } => {
                write!(f, "consistency oracle failed on candidate {index}: {message}")
            }
            Self::DiffFailure { index, message } => {
                write!(f, "diff metric failed on candidate {index}: {message}")
            }
            Self::GeneratorFailure(msg) => write!(f, "candidate generator failed: {msg}"),
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
        }
    }
}

impl std::error::Error for ReconcileError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_index() {
        let err = ReconcileError::OracleFailure { index: 3, message: "timeout".into() };
        assert_eq!(err.to_string(), "consistency oracle failed on candidate 3: timeout");
        assert_eq!(err.kind(), "oracle_failure");
    }

    #[test]
    fn no_consistent_reports_count() {
        let err = ReconcileError::NoConsistentCandidate { evaluated: 2 };
        assert!(err.to_string().contains("none of 2"));
    }
}
