//! Memo Statistics Module
//!
//! Tracks how a memoized function's calls were served.

use serde::Serialize;

// == Memo Stats ==
/// Per wrapped function counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoStats {
    /// Calls served from a fresh entry
    pub hits: u64,
    /// Calls that found no entry and had to populate it
    pub misses: u64,
    /// Stale entries refreshed before answering
    pub sync_refreshes: u64,
    /// Stale entries served while a background refresh was scheduled
    pub background_refreshes: u64,
    /// Background refreshes that ended in an error
    pub background_failures: u64,
}

impl MemoStats {
    // == Constructor ==
    /// Creates a new MemoStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Share of calls answered without waiting for the producer.
    ///
    /// Stale entries served in lazy mode count as hits. Returns 0.0 before
    /// the first call.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.background_refreshes;
        let total = served + self.misses + self.sync_refreshes;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_sync_refresh(&mut self) {
        self.sync_refreshes += 1;
    }

    pub fn record_background_refresh(&mut self) {
        self.background_refreshes += 1;
    }

    pub fn record_background_failure(&mut self) {
        self.background_failures += 1;
    }
}
