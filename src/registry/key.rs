//! Identity types for connections and transaction lifecycles.

use std::fmt;

use ulid::Ulid;

/// Stable identifier for a wrapped connection.
///
/// Minted when the wrapper is created and fixed for its lifetime. All
/// registration state lives inside the wrapper itself, so the id mostly
/// serves diagnostics and log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Ulid);

impl ConnectionId {
    pub(crate) fn new() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_lowercase())
    }
}

/// Identifier of one outermost transaction lifecycle.
///
/// A fresh id is minted at every outermost begin; nested scopes share the
/// id of the outermost scope whose fate they follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(Ulid);

impl TransactionId {
    pub(crate) fn new() -> Self {
        Self(Ulid::new())
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_string().to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
        assert_ne!(TransactionId::new(), TransactionId::new());
    }

    #[test]
    fn test_display_is_lowercase() {
        let id = TransactionId::new().to_string();
        assert_eq!(id, id.to_lowercase());
        assert_eq!(id.len(), 26);
    }
}
