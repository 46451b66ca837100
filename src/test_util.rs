//! Shared test doubles.
//!
//! A recording driver whose begin/commit/rollback calls land in a journal
//! and can be armed to fail, plus a probe observer that journals every
//! phase it is invoked with. Tests assert on the journal to check both
//! what fired and in what order.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::callback::{CallbackError, Phase, TransactionObserver};
use crate::connection::{DriverError, TransactionalConnection};

/// Ordered log of driver calls and callback invocations.
#[derive(Default)]
pub struct Journal {
    events: Mutex<Vec<String>>,
}

impl Journal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn count_of(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }
}

#[derive(Default)]
struct FailFlags {
    begin: bool,
    commit: bool,
    rollback: bool,
}

/// In-memory driver double. Every call is journaled before the armed
/// failure (if any) is raised, so tests can see that the driver was
/// reached even on failing paths.
pub struct RecordingDriver {
    journal: Arc<Journal>,
    flags: Mutex<FailFlags>,
}

impl RecordingDriver {
    pub fn new(journal: Arc<Journal>) -> Arc<Self> {
        Arc::new(Self {
            journal,
            flags: Mutex::new(FailFlags::default()),
        })
    }

    pub fn fail_begin(&self, fail: bool) {
        self.flags.lock().begin = fail;
    }

    pub fn fail_commit(&self, fail: bool) {
        self.flags.lock().commit = fail;
    }

    pub fn fail_rollback(&self, fail: bool) {
        self.flags.lock().rollback = fail;
    }

    fn call(&self, op: &str, armed: bool) -> Result<(), DriverError> {
        self.journal.push(format!("driver.{op}"));
        if armed {
            return Err(format!("injected {op} failure").into());
        }
        Ok(())
    }
}

/// Handle implementing the driver capability over a shared
/// [`RecordingDriver`], so a test can keep its own reference and flip
/// failure flags mid-scenario.
pub struct DriverHandle(pub Arc<RecordingDriver>);

impl TransactionalConnection for DriverHandle {
    fn begin(&mut self) -> Result<(), DriverError> {
        let armed = self.0.flags.lock().begin;
        self.0.call("begin", armed)
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        let armed = self.0.flags.lock().commit;
        self.0.call("commit", armed)
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        let armed = self.0.flags.lock().rollback;
        self.0.call("rollback", armed)
    }
}

/// Marker types giving probes distinct concrete types, so class-level
/// dedup can be exercised.
pub struct Alpha;
pub struct Beta;

/// Observer double: journals every phase it sees as `{name}.{phase}` and
/// can be armed to fail on one phase.
pub struct Probe<Kind = Alpha> {
    name: &'static str,
    journal: Arc<Journal>,
    fail_on: Option<Phase>,
    _kind: PhantomData<Kind>,
}

impl<Kind: Send + Sync + 'static> Probe<Kind> {
    pub fn new(name: &'static str, journal: Arc<Journal>) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal,
            fail_on: None,
            _kind: PhantomData,
        })
    }

    pub fn failing_on(name: &'static str, journal: Arc<Journal>, phase: Phase) -> Arc<Self> {
        Arc::new(Self {
            name,
            journal,
            fail_on: Some(phase),
            _kind: PhantomData,
        })
    }
}

impl<Kind: Send + Sync + 'static> TransactionObserver for Probe<Kind> {
    fn invoke_phase(&self, phase: Phase) -> Result<(), CallbackError> {
        self.journal.push(format!("{}.{}", self.name, phase));
        if self.fail_on == Some(phase) {
            return Err(format!("{} refused {}", self.name, phase).into());
        }
        Ok(())
    }
}
