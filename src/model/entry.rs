//! Managed map entry models.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::time::Instant;

use crate::workers::Watcher;

/// Outcome of spending one read from an entry's budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Read {
    /// The budget was already spent.
    Denied,
    /// One read was spent and more remain.
    Granted,
    /// The final read was spent; the entry must now be removed.
    Last,
}

/// Tracked state of one key.
pub(crate) struct Entry<V> {
    /// Generation tag, unique per created entry.
    id: u64,
    value: V,
    remaining: AtomicU64,
    deadline: Option<Instant>,
    watcher: Watcher,
}

impl<V> Entry<V> {
    pub(crate) fn new(id: u64, value: V, reads: u64, deadline: Option<Instant>, watcher: Watcher) -> Self {
        Self {
            id,
            value,
            remaining: AtomicU64::new(reads),
            deadline,
            watcher,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// Replaces the value; budget and deadline are left untouched.
    pub(crate) fn replace(&mut self, value: V) {
        self.value = value;
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Spends one read. Safe under concurrent callers holding only shared access:
    /// exactly one caller observes the transition to zero.
    pub(crate) fn consume(&self) -> Read {
        match self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        {
            Ok(1) => Read::Last,
            Ok(_) => Read::Granted,
            Err(_) => Read::Denied,
        }
    }

    /// An entry is live while its deadline has not passed and its budget is not spent.
    /// A dead entry may still sit in the map until its watcher unlinks it.
    pub(crate) fn is_live(&self, now: Instant) -> bool {
        self.remaining() > 0 && self.deadline.map_or(true, |at| now < at)
    }

    pub(crate) fn watcher(&self) -> &Watcher {
        &self.watcher
    }

    pub(crate) fn into_watcher(self) -> Watcher {
        self.watcher
    }
}
