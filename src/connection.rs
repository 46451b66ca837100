//! Driver capability for transaction control.
//!
//! This crate never talks to a database directly. The callback layer wraps
//! a `TransactionalConnection` supplied by the caller and delegates the
//! real begin/commit/rollback work to it, layering depth tracking and
//! callback dispatch on top.

use std::error::Error;

/// Error produced by a driver operation.
///
/// Drivers surface whatever concrete error type they like behind a boxed
/// trait object; the callback layer only threads it through.
pub type DriverError = Box<dyn Error + Send + Sync + 'static>;

/// Transaction control capability of an underlying database connection.
///
/// Implementations own the actual transaction semantics, including how
/// nested scopes map onto savepoints: a driver that supports savepoints is
/// expected to translate a nested begin into savepoint creation and a
/// nested commit/rollback into savepoint release/rollback. The wrapper
/// calls these hooks at every nesting level and adds no retry logic; a
/// failure propagates once, synchronously.
pub trait TransactionalConnection: Send {
    /// Open a transaction scope (outermost transaction or savepoint).
    fn begin(&mut self) -> Result<(), DriverError>;

    /// Commit the current scope.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// Roll back the current scope.
    fn rollback(&mut self) -> Result<(), DriverError>;
}
