//! Transaction layer error types.

use thiserror::Error;

use crate::callback::{CallbackError, Phase};
use crate::connection::DriverError;

/// Result type for transaction operations.
pub type TxResult<T> = Result<T, TxError>;

/// Errors surfaced by begin/commit/rollback on a wrapped connection.
#[derive(Debug, Error)]
pub enum TxError {
    /// The driver failed to open a transaction scope. Nesting depth has
    /// been restored to its prior value; no callbacks fired.
    #[error("failed to begin transaction: {0}")]
    Begin(#[source] DriverError),

    /// The driver failed to commit. Before-commit callbacks have already
    /// run and cannot be undone; after-commit callbacks were skipped and
    /// the scope's buckets were still cleaned up.
    #[error("failed to commit transaction: {0}")]
    Commit(#[source] DriverError),

    /// The driver failed to roll back. Cleanup for the scope still ran.
    #[error("failed to roll back transaction: {0}")]
    Rollback(#[source] DriverError),

    /// A registered callback failed. Siblings in the same phase were still
    /// attempted; this is the first failure observed, and no later phase
    /// ran.
    #[error("callback failed in {phase} phase: {source}")]
    Callback {
        /// The phase whose fan-out produced the failure.
        phase: Phase,
        #[source]
        source: CallbackError,
    },

    /// Application-level failure raised inside a `with_transaction` body.
    #[error("transaction aborted: {0}")]
    Aborted(String),
}

impl TxError {
    /// The phase a callback failure occurred in, if this is one.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            TxError::Callback { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// True when the error came out of a registered callback rather than
    /// the driver.
    pub fn is_callback(&self) -> bool {
        matches!(self, TxError::Callback { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = TxError::Begin("connection reset".into());
        assert_eq!(
            err.to_string(),
            "failed to begin transaction: connection reset"
        );

        let err = TxError::Callback {
            phase: Phase::AfterCommit,
            source: "cache refresh failed".into(),
        };
        assert_eq!(
            err.to_string(),
            "callback failed in after_commit phase: cache refresh failed"
        );
    }

    #[test]
    fn test_phase_accessor() {
        let err = TxError::Callback {
            phase: Phase::BeforeRollback,
            source: "boom".into(),
        };
        assert!(err.is_callback());
        assert_eq!(err.phase(), Some(Phase::BeforeRollback));
        assert_eq!(TxError::Commit("io".into()).phase(), None);
    }
}
