//! Callback dispatch.
//!
//! The order phases fire in is fixed. For a committing lifecycle:
//!
//! ```text
//! records/before_commit
//! records_on_create/before_commit_on_create
//! records_on_update/before_commit_on_update
//! records_on_save/before_commit_on_save
//! records_on_destroy/before_commit_on_destroy
//!         [driver commit]
//! records/after_commit
//! records_on_create/after_commit_on_create
//! records_on_update/after_commit_on_update
//! records_on_save/after_commit_on_save
//! records_on_destroy/after_commit_on_destroy
//! class_records/after_class_commit
//! ```
//!
//! and for a rolling-back lifecycle:
//!
//! ```text
//! records/before_rollback
//!         [driver rollback]
//! records/after_rollback
//! class_records/after_class_rollback
//! ```
//!
//! Within one (bucket, phase) pair entries fire in registration order.

use parking_lot::Mutex;

use crate::callback::Phase;
use crate::registry::Bucket;
use crate::transaction::error::{TxError, TxResult};
use crate::transaction::interceptor::TxState;

/// Pairs fired before the driver commit, in order.
pub(crate) const BEFORE_COMMIT_PLAN: &[(Bucket, Phase)] = &[
    (Bucket::Records, Phase::BeforeCommit),
    (Bucket::RecordsOnCreate, Phase::BeforeCommitOnCreate),
    (Bucket::RecordsOnUpdate, Phase::BeforeCommitOnUpdate),
    (Bucket::RecordsOnSave, Phase::BeforeCommitOnSave),
    (Bucket::RecordsOnDestroy, Phase::BeforeCommitOnDestroy),
];

/// Pairs fired after the driver commit succeeds. The class phase runs
/// last.
pub(crate) const AFTER_COMMIT_PLAN: &[(Bucket, Phase)] = &[
    (Bucket::Records, Phase::AfterCommit),
    (Bucket::RecordsOnCreate, Phase::AfterCommitOnCreate),
    (Bucket::RecordsOnUpdate, Phase::AfterCommitOnUpdate),
    (Bucket::RecordsOnSave, Phase::AfterCommitOnSave),
    (Bucket::RecordsOnDestroy, Phase::AfterCommitOnDestroy),
    (Bucket::ClassRecords, Phase::AfterClassCommit),
];

/// Pairs fired before the driver rollback.
pub(crate) const BEFORE_ROLLBACK_PLAN: &[(Bucket, Phase)] =
    &[(Bucket::Records, Phase::BeforeRollback)];

/// Pairs fired after the driver rollback. The class phase runs last.
pub(crate) const AFTER_ROLLBACK_PLAN: &[(Bucket, Phase)] = &[
    (Bucket::Records, Phase::AfterRollback),
    (Bucket::ClassRecords, Phase::AfterClassRollback),
];

/// Fans callbacks out over the entries a concluding scope filed.
pub(crate) struct CallbackDispatcher;

impl CallbackDispatcher {
    /// Fire every (bucket, phase) pair in `plan` against the entries filed
    /// at `depth`.
    ///
    /// Within a phase the fan-out is best-effort: every entry is attempted
    /// even after one fails, the first failure is kept, and it is returned
    /// once the phase completes. A failed phase stops the plan; later
    /// phases do not run.
    ///
    /// The store lock is released before any callback is invoked, so
    /// callbacks are free to re-enter the connection (register more
    /// records, or attempt a rollback).
    pub fn fire(state: &Mutex<TxState>, plan: &[(Bucket, Phase)], depth: u32) -> TxResult<()> {
        for &(bucket, phase) in plan {
            let entries = state.lock().store.pending(bucket, depth);
            let mut first_failure: Option<TxError> = None;
            for entry in entries {
                if let Err(source) = entry.invoke_phase(phase) {
                    if first_failure.is_none() {
                        first_failure = Some(TxError::Callback { phase, source });
                    }
                }
            }
            if let Some(err) = first_failure {
                return Err(err);
            }
        }
        Ok(())
    }
}
