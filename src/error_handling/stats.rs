//! Export service statistics tracking.
//!
//! Thread-safe counters for export outcomes and exported rows, shared by the
//! HTTP handlers and read by the `/status` endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ExportOutcome;

/// Thread-safe export statistics tracker.
///
/// Every `ExportOutcome` variant is initialized to zero on creation, so
/// lookups never miss. Share it across handlers with `Arc`.
pub struct ExportStats {
    outcomes: HashMap<ExportOutcome, AtomicUsize>,
    rows_exported: AtomicU64,
}

impl ExportStats {
    pub fn new() -> Self {
        let mut outcomes = HashMap::new();
        for outcome in ExportOutcome::iter() {
            outcomes.insert(outcome, AtomicUsize::new(0));
        }

        ExportStats {
            outcomes,
            rows_exported: AtomicU64::new(0),
        }
    }

    /// Record one request outcome.
    pub fn record(&self, outcome: ExportOutcome) {
        if let Some(counter) = self.outcomes.get(&outcome) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to record outcome {:?} which is not in the map. \
                 This indicates a bug in ExportStats initialization.",
                outcome
            );
        }
    }

    /// Record a completed export and the rows it carried.
    pub fn record_completed(&self, rows: u64) {
        self.record(ExportOutcome::Completed);
        self.rows_exported.fetch_add(rows, Ordering::Relaxed);
    }

    pub fn count(&self, outcome: ExportOutcome) -> usize {
        self.outcomes
            .get(&outcome)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Requests that did not end in `Completed`.
    pub fn total_failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(outcome, _)| **outcome != ExportOutcome::Completed)
            .map(|(_, c)| c.load(Ordering::SeqCst))
            .sum()
    }

    pub fn rows_exported(&self) -> u64 {
        self.rows_exported.load(Ordering::SeqCst)
    }
}

impl Default for ExportStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_initialization() {
        let stats = ExportStats::new();
        for outcome in ExportOutcome::iter() {
            assert_eq!(stats.count(outcome), 0);
        }
        assert_eq!(stats.rows_exported(), 0);
        assert_eq!(stats.total_failed(), 0);
    }

    #[test]
    fn test_record_completed_adds_rows() {
        let stats = ExportStats::new();
        stats.record_completed(3);
        stats.record_completed(1200);
        assert_eq!(stats.count(ExportOutcome::Completed), 2);
        assert_eq!(stats.rows_exported(), 1203);
        assert_eq!(stats.total_failed(), 0);
    }

    #[test]
    fn test_total_failed_excludes_completed() {
        let stats = ExportStats::new();
        stats.record_completed(10);
        stats.record(ExportOutcome::Forbidden);
        stats.record(ExportOutcome::FetchFailed);
        stats.record(ExportOutcome::FetchFailed);
        assert_eq!(stats.total_failed(), 3);
        assert_eq!(stats.count(ExportOutcome::FetchFailed), 2);
    }
}
