//! txhooks - Transaction-Aware Callback Dispatch
//!
//! This crate coordinates deferred callbacks around database transaction
//! boundaries: records register interest while a transaction is open, and
//! when the outermost scope concludes the registered callbacks fire —
//! exactly once, only for the outcome (commit or rollback) that actually
//! happened, in a fixed phase order. Nested scopes and savepoints are
//! handled by depth tracking: registrations made inside them are deferred
//! until the outermost scope decides their fate.
//!
//! The crate talks to the database only through an injected
//! [`connection::TransactionalConnection`]; the real begin/commit/rollback
//! (and savepoint) work stays in the driver.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use txhooks::callback::{CallbackError, Phase, TransactionObserver};
//! use txhooks::connection::{DriverError, TransactionalConnection};
//! use txhooks::transaction::CallbackConnection;
//!
//! struct MyDriver;
//!
//! impl TransactionalConnection for MyDriver {
//!     fn begin(&mut self) -> Result<(), DriverError> { Ok(()) }
//!     fn commit(&mut self) -> Result<(), DriverError> { Ok(()) }
//!     fn rollback(&mut self) -> Result<(), DriverError> { Ok(()) }
//! }
//!
//! struct AuditRow;
//!
//! impl TransactionObserver for AuditRow {
//!     fn invoke_phase(&self, phase: Phase) -> Result<(), CallbackError> {
//!         if phase == Phase::AfterCommit {
//!             println!("this write is durable now");
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let conn = CallbackConnection::new(MyDriver);
//! conn.begin_transaction().unwrap();
//! conn.register(Arc::new(AuditRow));
//! conn.commit_transaction().unwrap();
//! ```

pub mod callback;
pub mod connection;
pub mod registry;
pub mod transaction;

#[cfg(test)]
mod test_util;
