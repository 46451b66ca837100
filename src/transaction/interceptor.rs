//! The transaction interceptor.
//!
//! [`CallbackConnection`] wraps a driver connection by composition and
//! layers callback bookkeeping over its begin/commit/rollback operations.
//! Per connection the lifecycle is a small state machine,
//! `Idle -> Open(depth >= 1) -> Idle`: nested scopes only move the depth
//! counter, and the outermost commit or rollback is the single point where
//! registered callbacks fire and the scope's buckets are purged.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::callback::TransactionObserver;
use crate::connection::TransactionalConnection;
use crate::registry::{Bucket, ConnectionId, RegistrationStore, TransactionId};
use crate::transaction::depth::DepthTracker;
use crate::transaction::dispatch::{
    CallbackDispatcher, AFTER_COMMIT_PLAN, AFTER_ROLLBACK_PLAN, BEFORE_COMMIT_PLAN,
    BEFORE_ROLLBACK_PLAN,
};
use crate::transaction::error::{TxError, TxResult};

/// Metadata for the outermost transaction currently open on a connection.
#[derive(Debug, Clone)]
pub struct TransactionMetadata {
    /// Unique id of this outermost lifecycle.
    pub tx_id: TransactionId,
    /// When the outermost scope was opened.
    pub started_at: DateTime<Utc>,
    /// Current nesting depth (1 = only the outermost scope is open).
    pub depth: u32,
}

/// Lifecycle info minted at the outermost begin.
pub(crate) struct LifecycleInfo {
    tx_id: TransactionId,
    started_at: DateTime<Utc>,
}

/// Bookkeeping state for one connection: the nesting counters plus the
/// registration buckets. Guarded by a single mutex that is never held
/// across a driver call or a callback invocation, so callbacks can
/// re-enter the connection.
pub(crate) struct TxState {
    pub(crate) tracker: DepthTracker,
    pub(crate) store: RegistrationStore,
    pub(crate) lifecycle: Option<LifecycleInfo>,
}

struct ConnectionInner<C> {
    id: ConnectionId,
    driver: Mutex<C>,
    state: Mutex<TxState>,
}

/// A connection wrapper that fires registered callbacks at transaction
/// boundaries.
///
/// Records register while a transaction is open; when the outermost scope
/// concludes, the wrapper dispatches the commit or rollback phases to
/// every registered record, exactly once and only for the outcome that
/// actually happened. Nested scopes (savepoints) defer their
/// registrations to the enclosing scope.
///
/// Cloning is cheap and yields a handle to the same underlying
/// connection. The wrapper assumes the pooled-connection discipline: one
/// execution context uses a connection at a time.
pub struct CallbackConnection<C: TransactionalConnection> {
    inner: Arc<ConnectionInner<C>>,
}

impl<C: TransactionalConnection> Clone for CallbackConnection<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: TransactionalConnection> CallbackConnection<C> {
    /// Wrap a driver connection.
    pub fn new(driver: C) -> Self {
        Self {
            inner: Arc::new(ConnectionInner {
                id: ConnectionId::new(),
                driver: Mutex::new(driver),
                state: Mutex::new(TxState {
                    tracker: DepthTracker::new(),
                    store: RegistrationStore::new(),
                    lifecycle: None,
                }),
            }),
        }
    }

    /// Identity of this connection, stable for the wrapper's lifetime.
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    // ==================== Transaction Control ====================

    /// Open a transaction scope.
    ///
    /// The outermost begin starts a new lifecycle: fresh metadata is
    /// minted and the commit guard is reset. Nested begins only deepen
    /// the nesting; how they map onto savepoints is the driver's
    /// business. If the driver's begin fails, the depth is restored to
    /// its pre-call value and no callbacks fire.
    pub fn begin_transaction(&self) -> TxResult<()> {
        let outermost = {
            let mut state = self.inner.state.lock();
            let outermost = state.tracker.begin();
            if outermost {
                state.tracker.clear_committing();
                state.lifecycle = Some(LifecycleInfo {
                    tx_id: TransactionId::new(),
                    started_at: Utc::now(),
                });
            }
            outermost
        };
        if let Err(err) = self.inner.driver.lock().begin() {
            let mut state = self.inner.state.lock();
            state.tracker.unwind_begin();
            if outermost {
                state.lifecycle = None;
            }
            return Err(TxError::Begin(err));
        }
        Ok(())
    }

    /// Commit the current scope.
    ///
    /// Only the outermost commit dispatches callbacks: before-commit
    /// phases fire, then the driver commit, then the after-commit phases
    /// with the class phase last. A nested commit delegates to the driver
    /// and decrements depth — filed registrations are left untouched so
    /// the enclosing scope sees them.
    ///
    /// Buckets are purged and depth unwound on every path out of the
    /// outermost commit. A failure raised by an after-commit callback
    /// leaves the commit guard set, so the rollback the caller then
    /// issues is downgraded instead of undoing a commit that already
    /// happened.
    pub fn commit_transaction(&self) -> TxResult<()> {
        let drain_depth = {
            let mut state = self.inner.state.lock();
            if !state.tracker.closing_outermost() {
                state.tracker.end();
                drop(state);
                return self.inner.driver.lock().commit().map_err(TxError::Commit);
            }
            state.tracker.enter_dispatch();
            state.tracker.drain_depth()
        };

        let result = self.run_commit_dispatch(drain_depth);

        let mut state = self.inner.state.lock();
        state.store.purge_all();
        state.tracker.end();
        state.tracker.exit_dispatch();
        state.lifecycle = None;
        if result.is_ok() {
            state.tracker.clear_committing();
        }
        result
    }

    fn run_commit_dispatch(&self, depth: u32) -> TxResult<()> {
        CallbackDispatcher::fire(&self.inner.state, BEFORE_COMMIT_PLAN, depth)?;
        self.inner.driver.lock().commit().map_err(TxError::Commit)?;
        self.inner.state.lock().tracker.mark_committing();
        CallbackDispatcher::fire(&self.inner.state, AFTER_COMMIT_PLAN, depth)
    }

    /// Roll back the current scope.
    ///
    /// With the commit guard set this call belongs to a lifecycle whose
    /// driver commit already succeeded and must not be undone twice. At
    /// depth zero it is a caller-level handler reacting to a failed
    /// after-commit callback: the one legitimate driver rollback runs and
    /// the lifecycle is over. At depth above zero it is a scope opened
    /// after the commit (typically from inside a callback) and only
    /// unwinds nesting.
    ///
    /// Without the guard, the outermost rollback fires before-rollback,
    /// delegates the driver rollback, fires after-rollback and the class
    /// rollback phase, then purges. Nested rollbacks are bookkeeping plus
    /// driver delegation, like nested commits.
    pub fn rollback_transaction(&self) -> TxResult<()> {
        let drain_depth = {
            let mut state = self.inner.state.lock();
            if state.tracker.is_committing() {
                if state.tracker.open_depth() > 0 {
                    state.tracker.end();
                    return Ok(());
                }
                state.tracker.clear_committing();
                drop(state);
                return self
                    .inner
                    .driver
                    .lock()
                    .rollback()
                    .map_err(TxError::Rollback);
            }
            if !state.tracker.closing_outermost() {
                state.tracker.end();
                drop(state);
                return self
                    .inner
                    .driver
                    .lock()
                    .rollback()
                    .map_err(TxError::Rollback);
            }
            state.tracker.enter_dispatch();
            state.tracker.drain_depth()
        };

        let result = self.run_rollback_dispatch(drain_depth);

        let mut state = self.inner.state.lock();
        state.store.purge_all();
        state.tracker.end();
        state.tracker.exit_dispatch();
        state.lifecycle = None;
        result
    }

    fn run_rollback_dispatch(&self, depth: u32) -> TxResult<()> {
        CallbackDispatcher::fire(&self.inner.state, BEFORE_ROLLBACK_PLAN, depth)?;
        self.inner
            .driver
            .lock()
            .rollback()
            .map_err(TxError::Rollback)?;
        CallbackDispatcher::fire(&self.inner.state, AFTER_ROLLBACK_PLAN, depth)
    }

    /// Execute `f` inside a transaction, committing on success and
    /// rolling back on failure.
    ///
    /// The rollback on the failure path doubles as the caller-level
    /// handler of the double-rollback design: if the commit itself failed
    /// out of an after-commit callback, the rollback issued here is
    /// downgraded to the single legitimate driver rollback.
    pub fn with_transaction<F, T>(&self, f: F) -> TxResult<T>
    where
        F: FnOnce(&Self) -> TxResult<T>,
    {
        self.begin_transaction()?;

        match f(self).and_then(|value| self.commit_transaction().map(|_| value)) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.rollback_transaction()?;
                Err(e)
            }
        }
    }

    // ==================== Registration ====================

    /// Register `record` for the generic commit/rollback phases. Also
    /// files it for the class-level phases, once per record type per
    /// lifecycle.
    pub fn register(&self, record: Arc<dyn TransactionObserver>) {
        let mut state = self.inner.state.lock();
        let depth = state.tracker.registration_depth();
        state.store.register(Bucket::Records, depth, record.clone());
        state.store.register_class_once(depth, record);
    }

    /// Register `record` for the create-specific phases.
    pub fn register_on_create(&self, record: Arc<dyn TransactionObserver>) {
        self.register_in(Bucket::RecordsOnCreate, record);
    }

    /// Register `record` for the update-specific phases.
    pub fn register_on_update(&self, record: Arc<dyn TransactionObserver>) {
        self.register_in(Bucket::RecordsOnUpdate, record);
    }

    /// Register `record` for the save-specific phases.
    pub fn register_on_save(&self, record: Arc<dyn TransactionObserver>) {
        self.register_in(Bucket::RecordsOnSave, record);
    }

    /// Register `record` for the destroy-specific phases.
    pub fn register_on_destroy(&self, record: Arc<dyn TransactionObserver>) {
        self.register_in(Bucket::RecordsOnDestroy, record);
    }

    /// Register `record` for the class-level phases only, once per record
    /// type per lifecycle.
    pub fn register_class(&self, record: Arc<dyn TransactionObserver>) {
        let mut state = self.inner.state.lock();
        let depth = state.tracker.registration_depth();
        state.store.register_class_once(depth, record);
    }

    fn register_in(&self, bucket: Bucket, record: Arc<dyn TransactionObserver>) {
        let mut state = self.inner.state.lock();
        let depth = state.tracker.registration_depth();
        state.store.register(bucket, depth, record.clone());
        state.store.register_class_once(depth, record);
    }

    // ==================== Introspection ====================

    /// Current transaction nesting depth (0 = no open transaction).
    pub fn depth(&self) -> u32 {
        self.inner.state.lock().tracker.open_depth()
    }

    /// Whether a transaction scope is open on this connection.
    pub fn in_transaction(&self) -> bool {
        self.depth() > 0
    }

    /// Whether this connection sits in the window between a successful
    /// outermost commit and the end of that lifecycle.
    pub fn is_committing(&self) -> bool {
        self.inner.state.lock().tracker.is_committing()
    }

    /// Number of callback registrations waiting on the current lifecycle.
    pub fn pending_callbacks(&self) -> usize {
        self.inner.state.lock().store.pending_count()
    }

    /// Metadata for the outermost transaction currently open, if any.
    pub fn current_transaction(&self) -> Option<TransactionMetadata> {
        let state = self.inner.state.lock();
        state.lifecycle.as_ref().map(|lifecycle| TransactionMetadata {
            tx_id: lifecycle.tx_id,
            started_at: lifecycle.started_at,
            depth: state.tracker.open_depth(),
        })
    }

    /// Consume the wrapper and hand back the driver connection. Returns
    /// `None` while other handles to this connection exist.
    pub fn into_inner(self) -> Option<C> {
        Arc::into_inner(self.inner).map(|inner| inner.driver.into_inner())
    }
}

impl<C: TransactionalConnection> fmt::Debug for CallbackConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CallbackConnection")
            .field("id", &self.inner.id)
            .field("depth", &state.tracker.open_depth())
            .field("pending", &state.store.pending_count())
            .field("committing", &state.tracker.is_committing())
            .finish()
    }
}
