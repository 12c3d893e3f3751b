//! Global atomic counters for editor activity.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit the current values as one `tracing::info!`
//! event, e.g. when a CLI command finishes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    validations_run: AtomicU64,
    validations_superseded: AtomicU64,
    category_fetches: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            validations_run: AtomicU64::new(0),
            validations_superseded: AtomicU64::new(0),
            category_fetches: AtomicU64::new(0),
        }
    }

    /// A debounced validation pass settled and was recorded.
    pub fn inc_validations_run(&self) {
        self.validations_run.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "validations_run", "counter incremented");
    }

    /// A pending validation was re-armed by a newer edit.
    pub fn inc_validations_superseded(&self) {
        self.validations_superseded.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "validations_superseded", "counter incremented");
    }

    /// A file category or media listing was fetched successfully.
    pub fn inc_category_fetches(&self) {
        self.category_fetches.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "category_fetches", "counter incremented");
    }

    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            validations_run = self.validations_run(),
            validations_superseded = self.validations_superseded(),
            category_fetches = self.category_fetches(),
        );
    }

    pub fn validations_run(&self) -> u64 {
        self.validations_run.load(Ordering::Relaxed)
    }

    pub fn validations_superseded(&self) -> u64 {
        self.validations_superseded.load(Ordering::Relaxed)
    }

    pub fn category_fetches(&self) -> u64 {
        self.category_fetches.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.validations_run.store(0, Ordering::Relaxed);
        self.validations_superseded.store(0, Ordering::Relaxed);
        self.category_fetches.store(0, Ordering::Relaxed);
    }
}
