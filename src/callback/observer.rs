//! The capability registered records implement.

use std::any::Any;
use std::error::Error;

use crate::callback::phase::Phase;

/// Error surfaced by a callback implementation.
pub type CallbackError = Box<dyn Error + Send + Sync + 'static>;

/// Capability of a record registered for transaction callbacks.
///
/// The dispatcher treats implementers purely as phase sinks: it calls
/// `invoke_phase` with whatever phases the record's buckets subscribe it
/// to and has no knowledge of what a phase means to the record. The `Any`
/// supertrait supplies the concrete type identity used to deduplicate the
/// class-level bucket, so one instance per record type represents its type
/// for the class phases.
pub trait TransactionObserver: Any + Send + Sync {
    /// Run the record's logic for `phase`.
    ///
    /// A failure does not stop sibling records in the same phase; the
    /// first failure observed is surfaced to the caller of the triggering
    /// commit or rollback once the phase's fan-out completes.
    fn invoke_phase(&self, phase: Phase) -> Result<(), CallbackError>;
}
