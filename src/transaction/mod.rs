//! Transaction interception and callback dispatch.
//!
//! This module is the core of the crate: it decides, at every commit and
//! rollback boundary, whether callbacks fire or registrations are left for
//! the enclosing scope, and it keeps a committed transaction from being
//! rolled back a second time.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   CallbackConnection                        │
//! │   (wraps the driver, tracks nesting, owns the buckets)      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │   Depth     │       │  Callback   │       │Registration │
//!  │  Tracker    │       │ Dispatcher  │       │   Store     │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use txhooks::transaction::CallbackConnection;
//!
//! let conn = CallbackConnection::new(driver);
//!
//! conn.begin_transaction()?;
//! conn.register_on_save(record);
//! conn.commit_transaction()?; // fires before/after commit phases
//! ```

mod depth;
mod dispatch;
mod error;
mod interceptor;

pub use error::{TxError, TxResult};
pub use interceptor::{CallbackConnection, TransactionMetadata};
