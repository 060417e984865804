// ═══════════════════════════════════════════════════════════════
// RUN STATS - How many doors we knocked on, and what happened
// ═══════════════════════════════════════════════════════════════
//
// Atomic counters bumped by every probe task. No locks, because hundreds
// of tasks finish at roughly the same moment and none of them should wait
// on each other just to say "done".

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::models::ProbeOutcome;

/// Serializable view of a run's counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunSnapshot {
    pub launched: u64,
    pub completed: u64,
    pub matched: u64,
    pub not_found: u64,
    pub errored: u64,
    pub cancelled: u64,
    pub elapsed_ms: u64,
}

pub struct RunStats {
    launched: AtomicU64,
    completed: AtomicU64,
    matched: AtomicU64,
    not_found: AtomicU64,
    errored: AtomicU64,
    cancelled: AtomicU64,
    start_time: Instant,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            launched: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            matched: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            errored: AtomicU64::new(0),
            cancelled: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_launch(&self) {
        self.launched.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one finished probe. Cancellations are tracked apart from the
    /// other errors so an interrupted run doesn't look like a network outage.
    pub fn record_outcome(&self, outcome: &ProbeOutcome) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        match &outcome.result {
            Ok(true) => self.matched.fetch_add(1, Ordering::Relaxed),
            Ok(false) => self.not_found.fetch_add(1, Ordering::Relaxed),
            Err(e) if e.is_cancelled() => self.cancelled.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.errored.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Probes launched but not finished yet.
    pub fn in_flight(&self) -> u64 {
        self.launched
            .load(Ordering::Relaxed)
            .saturating_sub(self.completed.load(Ordering::Relaxed))
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            launched: self.launched.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            matched: self.matched.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            elapsed_ms: self.start_time.elapsed().as_millis() as u64,
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}
