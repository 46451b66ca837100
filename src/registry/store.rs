//! Bucketed registration storage.

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::callback::TransactionObserver;

/// Named collections of pending callback registrations.
///
/// A record lands in one of these depending on which registration entry
/// point filed it; the bucket decides which phases it will see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Every record registered for the generic commit/rollback phases.
    Records,
    /// Records registered for the create-specific phases.
    RecordsOnCreate,
    /// Records registered for the update-specific phases.
    RecordsOnUpdate,
    /// Records registered for the save-specific phases.
    RecordsOnSave,
    /// Records registered for the destroy-specific phases.
    RecordsOnDestroy,
    /// One representative record per distinct record type, for the
    /// class-level phases.
    ClassRecords,
}

impl Bucket {
    /// Stable snake_case name of the bucket.
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Records => "records",
            Bucket::RecordsOnCreate => "records_on_create",
            Bucket::RecordsOnUpdate => "records_on_update",
            Bucket::RecordsOnSave => "records_on_save",
            Bucket::RecordsOnDestroy => "records_on_destroy",
            Bucket::ClassRecords => "class_records",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A filed registration. Entries are never copied between connections;
/// ownership is scoped to the buckets of the connection that filed them.
pub(crate) type Entry = Arc<dyn TransactionObserver>;

/// Per-connection, per-depth registration storage.
///
/// Owned by the connection wrapper; two connections never share a store,
/// which is what keeps independent execution contexts from observing each
/// other's pending callbacks.
#[derive(Default)]
pub(crate) struct RegistrationStore {
    /// Bucket lists keyed by (bucket, registration depth). Insertion order
    /// within a list is the order callbacks fire in within a phase.
    entries: HashMap<(Bucket, u32), Vec<Entry>>,
    /// Record types already granted a `ClassRecords` slot, per depth.
    /// Dedup bookkeeping only; never dispatched.
    seen_classes: HashMap<u32, HashSet<TypeId>>,
}

impl RegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry under (bucket, depth). No uniqueness constraint;
    /// registering the same record twice fires it twice.
    pub fn register(&mut self, bucket: Bucket, depth: u32, entry: Entry) {
        self.entries.entry((bucket, depth)).or_default().push(entry);
    }

    /// File an entry in `ClassRecords` unless its concrete type already
    /// holds a slot at this depth.
    pub fn register_class_once(&mut self, depth: u32, entry: Entry) {
        let type_id = (entry.as_ref() as &dyn Any).type_id();
        let seen = self.seen_classes.entry(depth).or_default();
        if seen.insert(type_id) {
            self.register(Bucket::ClassRecords, depth, entry);
        }
    }

    /// Snapshot of the entries filed under (bucket, depth), in
    /// registration order. A missing key yields an empty list, not an
    /// error.
    ///
    /// Entries stay in place: the before- and after- phases of one
    /// dispatch must observe the same registration set, so removal is
    /// [`purge_all`](Self::purge_all)'s job.
    pub fn pending(&self, bucket: Bucket, depth: u32) -> Vec<Entry> {
        self.entries
            .get(&(bucket, depth))
            .cloned()
            .unwrap_or_default()
    }

    /// Total pending entries across all buckets and depths.
    pub fn pending_count(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Drop every bucket list at every depth, and the dedup bookkeeping
    /// with it. Runs once per outermost lifecycle, on commit and rollback
    /// alike.
    pub fn purge_all(&mut self) {
        self.entries.clear();
        self.seen_classes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callback::Phase;
    use crate::test_util::{Alpha, Beta, Journal, Probe};

    #[test]
    fn test_register_preserves_order() {
        let journal = Journal::new();
        let mut store = RegistrationStore::new();
        let a = Probe::<Alpha>::new("a", journal.clone());
        let b = Probe::<Alpha>::new("b", journal.clone());
        store.register(Bucket::Records, 0, a);
        store.register(Bucket::Records, 0, b);

        let pending = store.pending(Bucket::Records, 0);
        assert_eq!(pending.len(), 2);
        for entry in &pending {
            entry.invoke_phase(Phase::AfterCommit).unwrap();
        }
        assert_eq!(journal.events(), vec!["a.after_commit", "b.after_commit"]);
    }

    #[test]
    fn test_missing_key_is_empty() {
        let store = RegistrationStore::new();
        assert!(store.pending(Bucket::RecordsOnCreate, 0).is_empty());
        assert!(store.pending(Bucket::Records, 7).is_empty());
    }

    #[test]
    fn test_depths_are_partitioned() {
        let journal = Journal::new();
        let mut store = RegistrationStore::new();
        store.register(Bucket::Records, 0, Probe::<Alpha>::new("a", journal.clone()));
        store.register(Bucket::Records, 1, Probe::<Alpha>::new("b", journal.clone()));

        assert_eq!(store.pending(Bucket::Records, 0).len(), 1);
        assert_eq!(store.pending(Bucket::Records, 1).len(), 1);
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn test_class_once_dedups_by_type() {
        let journal = Journal::new();
        let mut store = RegistrationStore::new();
        store.register_class_once(0, Probe::<Alpha>::new("a1", journal.clone()));
        store.register_class_once(0, Probe::<Alpha>::new("a2", journal.clone()));
        store.register_class_once(0, Probe::<Beta>::new("b", journal.clone()));

        let pending = store.pending(Bucket::ClassRecords, 0);
        assert_eq!(pending.len(), 2);
        for entry in &pending {
            entry.invoke_phase(Phase::AfterClassCommit).unwrap();
        }
        // first instance of each type represents its type
        assert_eq!(
            journal.events(),
            vec!["a1.after_class_commit", "b.after_class_commit"]
        );
    }

    #[test]
    fn test_class_dedup_is_per_depth() {
        let journal = Journal::new();
        let mut store = RegistrationStore::new();
        store.register_class_once(0, Probe::<Alpha>::new("outer", journal.clone()));
        store.register_class_once(1, Probe::<Alpha>::new("inner", journal.clone()));

        assert_eq!(store.pending(Bucket::ClassRecords, 0).len(), 1);
        assert_eq!(store.pending(Bucket::ClassRecords, 1).len(), 1);
    }

    #[test]
    fn test_purge_all_clears_everything() {
        let journal = Journal::new();
        let mut store = RegistrationStore::new();
        let probe = Probe::<Alpha>::new("a", journal.clone());
        store.register(Bucket::Records, 0, probe.clone());
        store.register(Bucket::RecordsOnSave, 2, probe.clone());
        store.register_class_once(0, probe.clone());
        assert_ne!(store.pending_count(), 0);

        store.purge_all();
        assert_eq!(store.pending_count(), 0);

        // purge also resets the class dedup, so the type can re-register
        store.register_class_once(0, probe);
        assert_eq!(store.pending(Bucket::ClassRecords, 0).len(), 1);
    }
}
