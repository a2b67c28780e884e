//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, missing file) |
//! | 3-9     | reconcile        | Reconciliation outcomes                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `reconcile_exit_code` or the relevant command

use mindrift_reconcile::ReconcileError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure (unreadable file, write failure).
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Reconcile (3-9)
// =============================================================================

/// The candidate list was empty.
pub const EXIT_RECON_EMPTY: u8 = 3;

/// Candidates existed but none was consistent with the new destination.
pub const EXIT_RECON_NO_CONSISTENT: u8 = 4;

/// Deadline expired before every candidate was evaluated.
pub const EXIT_RECON_CANCELLED: u8 = 5;

/// An oracle, metric, or generator call failed.
pub const EXIT_RECON_CAPABILITY: u8 = 6;

/// Job file failed to parse or validate.
pub const EXIT_RECON_INVALID_JOB: u8 = 7;

/// A winner was found but its diff exceeds the configured tolerance
/// (only with `--fail-on-tolerance`).
pub const EXIT_RECON_TOLERANCE: u8 = 8;

/// Map a ReconcileError to its exit code.
pub fn reconcile_exit_code(err: &ReconcileError) -> u8 {
    match err {
        ReconcileError::EmptyCandidateSet => EXIT_RECON_EMPTY,
        ReconcileError::NoConsistentCandidate { .. } => EXIT_RECON_NO_CONSISTENT,
        ReconcileError::Cancelled => EXIT_RECON_CANCELLED,
        ReconcileError::OracleFailure { .. }
        | ReconcileError::DiffFailure { .. }
        | ReconcileError::GeneratorFailure(_) => EXIT_RECON_CAPABILITY,
        ReconcileError::ConfigParse(_) | ReconcileError::ConfigValidation(_) => EXIT_RECON_INVALID_JOB,
    }
}
