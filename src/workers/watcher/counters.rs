// Package watcher provides counters for entry lifecycle events.

use std::sync::atomic::{AtomicU64, Ordering};

use super::watcher::Cause;

/// Lifecycle counters of one map. All values only grow.
pub struct Counters {
    /// Reads that returned a value.
    pub hits: AtomicU64,
    /// Reads that found nothing eligible.
    pub misses: AtomicU64,
    /// Writes that created a new entry.
    pub inserts: AtomicU64,
    /// Writes that replaced the value of a live entry.
    pub updates: AtomicU64,
    /// Entries unlinked because their timeout elapsed.
    pub expired_timeout: AtomicU64,
    /// Entries unlinked because their read budget ran out.
    pub expired_budget: AtomicU64,
    /// Entries unlinked by an explicit remove.
    pub removed: AtomicU64,
}

/// Point-in-time copy of [`Counters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub updates: u64,
    pub expired_timeout: u64,
    pub expired_budget: u64,
    pub removed: u64,
}

impl Counters {
    /// Creates new counters.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            inserts: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            expired_timeout: AtomicU64::new(0),
            expired_budget: AtomicU64::new(0),
            removed: AtomicU64::new(0),
        }
    }

    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn expired(&self, cause: Cause) {
        match cause {
            Cause::Timeout => self.expired_timeout.fetch_add(1, Ordering::Relaxed),
            Cause::Budget => self.expired_budget.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Returns the current values.
    pub fn snapshot(&self) -> Stats {
        Stats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            expired_timeout: self.expired_timeout.load(Ordering::Relaxed),
            expired_budget: self.expired_budget.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
        }
    }
}

impl Default for Counters {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    /// Events that happened since `earlier` was taken.
    pub fn since(&self, earlier: &Stats) -> Stats {
        Stats {
            hits: self.hits.saturating_sub(earlier.hits),
            misses: self.misses.saturating_sub(earlier.misses),
            inserts: self.inserts.saturating_sub(earlier.inserts),
            updates: self.updates.saturating_sub(earlier.updates),
            expired_timeout: self.expired_timeout.saturating_sub(earlier.expired_timeout),
            expired_budget: self.expired_budget.saturating_sub(earlier.expired_budget),
            removed: self.removed.saturating_sub(earlier.removed),
        }
    }

    /// Total number of entries that left the map.
    pub fn evicted(&self) -> u64 {
        self.expired_timeout + self.expired_budget + self.removed
    }
}
