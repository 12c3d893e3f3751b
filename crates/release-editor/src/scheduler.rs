//! Debounced per-path validation
//!
//! Every document path owns an independent slot that moves
//! `Idle -> Pending -> Validating -> Idle`. Scheduling a path that already
//! has a slot aborts the old task and re-arms the quiet-period timer, so a
//! burst of edits to one path produces exactly one validation pass, run
//! against the last value. A generation number guards the write-back: a pass
//! that was superseded while evaluating never records its outcome.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::domain::{EditorError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::path::Path;
use crate::schema::{validate_field, Rule};

/// Receiver of settled validation outcomes.
pub trait ErrorSink: Send + Sync + 'static {
    /// `Ok(())` clears the messages at `path`; `Err` replaces them.
    fn record(&self, path: &Path, outcome: std::result::Result<(), Vec<String>>);
}

/// Lifecycle of one path's validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationState {
    Idle,
    Pending,
    Validating,
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    state: ValidationState,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Shared {
    slots: Mutex<HashMap<Path, Slot>>,
    settled: Notify,
    passes: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coalesces edits per path and validates after a quiet period.
pub struct ValidationScheduler {
    quiet_period: Duration,
    sink: Arc<dyn ErrorSink>,
    shared: Arc<Shared>,
    next_generation: AtomicU64,
}

impl std::fmt::Debug for ValidationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationScheduler")
            .field("quiet_period", &self.quiet_period)
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl ValidationScheduler {
    pub fn new(quiet_period: Duration, sink: Arc<dyn ErrorSink>) -> Self {
        Self {
            quiet_period,
            sink,
            shared: Arc::new(Shared::default()),
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Arm (or re-arm) validation of `value` at `path` against `rule`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(&self, path: Path, rule: Rule, value: Value) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| EditorError::NoRuntime)?;
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;

        // Held until the new slot is inserted so the task cannot observe a
        // missing slot.
        let mut slots = lock(&self.shared.slots);
        if let Some(previous) = slots.remove(&path) {
            previous.handle.abort();
            METRICS.inc_validations_superseded();
            trace!(path = %path, superseded = previous.generation, "validation re-armed");
        }

        let handle = runtime.spawn(run_pass(
            Arc::clone(&self.shared),
            Arc::clone(&self.sink),
            self.quiet_period,
            path.clone(),
            generation,
            rule,
            value,
        ));
        slots.insert(
            path,
            Slot {
                generation,
                state: ValidationState::Pending,
                handle,
            },
        );
        Ok(())
    }

    /// Current state of `path`.
    pub fn state(&self, path: &Path) -> ValidationState {
        lock(&self.shared.slots)
            .get(path)
            .map(|slot| slot.state)
            .unwrap_or(ValidationState::Idle)
    }

    /// Paths that are pending or validating.
    pub fn pending_count(&self) -> usize {
        lock(&self.shared.slots).len()
    }

    /// Validation passes that ran to completion and were recorded.
    pub fn passes_run(&self) -> u64 {
        self.shared.passes.load(Ordering::Relaxed)
    }

    /// Wait until every armed path has settled.
    pub async fn settle(&self) {
        loop {
            let notified = self.shared.settled.notified();
            if self.pending_count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for ValidationScheduler {
    fn drop(&mut self) {
        for (_, slot) in lock(&self.shared.slots).drain() {
            slot.handle.abort();
        }
    }
}

async fn run_pass(
    shared: Arc<Shared>,
    sink: Arc<dyn ErrorSink>,
    quiet_period: Duration,
    path: Path,
    generation: u64,
    rule: Rule,
    value: Value,
) {
    tokio::time::sleep(quiet_period).await;

    {
        let mut slots = lock(&shared.slots);
        match slots.get_mut(&path) {
            Some(slot) if slot.generation == generation => slot.state = ValidationState::Validating,
            _ => return,
        }
    }

    let outcome = validate_field(&rule, &value).await;

    let mut slots = lock(&shared.slots);
    if !matches!(slots.get(&path), Some(slot) if slot.generation == generation) {
        debug!(path = %path, generation, "discarding superseded validation result");
        return;
    }
    slots.remove(&path);
    shared.passes.fetch_add(1, Ordering::Relaxed);
    METRICS.inc_validations_run();
    obs::emit_field_validated(&path, outcome.as_ref().err().map_or(0, Vec::len));
    sink.record(&path, outcome);
    drop(slots);
    shared.settled.notify_waiters();
}
