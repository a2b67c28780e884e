use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ReconcileError;

/// Shared cancellation flag with an optional deadline.
///
/// Clones share the flag, so a caller can keep one handle and pass another
/// into [`crate::ReconcileOptions`]. Workers check the token before each
/// capability call; a call already in flight runs to completion but its
/// result is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that fires once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().until(Instant::now() + timeout)
    }

    /// Same flag, with `deadline` applied (the earlier deadline wins).
    pub fn until(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::SeqCst) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    pub fn check(&self) -> Result<(), ReconcileError> {
        if self.is_cancelled() {
            Err(ReconcileError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_flag() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
        assert_eq!(token.check(), Err(ReconcileError::Cancelled));
    }

    #[test]
    fn elapsed_deadline_cancels() {
        let token = CancelToken::new().until(Instant::now() - Duration::from_millis(1));
        assert!(token.is_cancelled());
    }

    #[test]
    fn earlier_deadline_wins() {
        let now = Instant::now();
        let token = CancelToken::new().until(now + Duration::from_secs(5));
        let tighter = token.until(now + Duration::from_secs(60));
        assert_eq!(tighter.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn derived_token_shares_flag() {
        let token = CancelToken::new();
        let derived = token.until(Instant::now() + Duration::from_secs(60));
        token.cancel();
        assert!(derived.is_cancelled());
    }
}
