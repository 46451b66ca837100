//! Callback capabilities.
//!
//! What a registered record looks like to the transaction layer: a
//! [`TransactionObserver`] that can be invoked with any [`Phase`]. Which
//! phases actually reach a record is decided by the bucket it was
//! registered in, not by the record itself.

mod observer;
mod phase;

pub use observer::{CallbackError, TransactionObserver};
pub use phase::Phase;
