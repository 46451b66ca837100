//! Callback phases.
//!
//! A closed set of phase identifiers replaces stringly-typed callback
//! names: the dispatcher maps buckets to phases with enum matching, and a
//! registered record implements one `invoke_phase` entry point.

use std::fmt;

/// A named callback moment in the transaction lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Fired for every touched record before the driver commit runs.
    BeforeCommit,
    /// Fired for created records before the driver commit runs.
    BeforeCommitOnCreate,
    BeforeCommitOnUpdate,
    BeforeCommitOnSave,
    BeforeCommitOnDestroy,
    /// Fired for every touched record once the driver commit succeeded.
    AfterCommit,
    /// Fired for created records once the driver commit succeeded.
    AfterCommitOnCreate,
    AfterCommitOnUpdate,
    AfterCommitOnSave,
    AfterCommitOnDestroy,
    /// Fired once per record type once the driver commit succeeded.
    AfterClassCommit,
    /// Fired for every touched record before the driver rollback runs.
    BeforeRollback,
    /// Fired for every touched record after the driver rollback ran.
    AfterRollback,
    /// Fired once per record type after the driver rollback ran.
    AfterClassRollback,
}

impl Phase {
    /// Stable snake_case name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::BeforeCommit => "before_commit",
            Phase::BeforeCommitOnCreate => "before_commit_on_create",
            Phase::BeforeCommitOnUpdate => "before_commit_on_update",
            Phase::BeforeCommitOnSave => "before_commit_on_save",
            Phase::BeforeCommitOnDestroy => "before_commit_on_destroy",
            Phase::AfterCommit => "after_commit",
            Phase::AfterCommitOnCreate => "after_commit_on_create",
            Phase::AfterCommitOnUpdate => "after_commit_on_update",
            Phase::AfterCommitOnSave => "after_commit_on_save",
            Phase::AfterCommitOnDestroy => "after_commit_on_destroy",
            Phase::AfterClassCommit => "after_class_commit",
            Phase::BeforeRollback => "before_rollback",
            Phase::AfterRollback => "after_rollback",
            Phase::AfterClassRollback => "after_class_rollback",
        }
    }

    /// True for phases that run before the driver operation.
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            Phase::BeforeCommit
                | Phase::BeforeCommitOnCreate
                | Phase::BeforeCommitOnUpdate
                | Phase::BeforeCommitOnSave
                | Phase::BeforeCommitOnDestroy
                | Phase::BeforeRollback
        )
    }

    /// True for phases delivered on the rollback path.
    pub fn is_rollback(&self) -> bool {
        matches!(
            self,
            Phase::BeforeRollback | Phase::AfterRollback | Phase::AfterClassRollback
        )
    }

    /// True for phases delivered on the commit path.
    pub fn is_commit(&self) -> bool {
        !self.is_rollback()
    }

    /// True for the once-per-type class-level phases.
    pub fn is_class_level(&self) -> bool {
        matches!(self, Phase::AfterClassCommit | Phase::AfterClassRollback)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
