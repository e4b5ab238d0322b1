//! Entry lifetime: how long and how many reads an entry survives.

use std::num::NonZeroU64;
use std::time::Duration;
use tokio::time::Instant;

/// Timeout applied when no override is given.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);
/// Read budget applied when no override is given.
pub const DEFAULT_ACCESS_BUDGET: u64 = 1;

/// Lifetime bounds of a single entry.
///
/// `None` in either field means the bound is unbounded. An entry is removed by
/// whichever bound it hits first.
///
/// ```rust
/// use managedmap::Lifetime;
/// use std::time::Duration;
///
/// // Zero keeps its "unbounded" meaning at the boundary.
/// let lifetime = Lifetime::new(Duration::ZERO, 3);
/// assert_eq!(lifetime.timeout(), None);
/// assert_eq!(lifetime.access_budget().map(|n| n.get()), Some(3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    timeout: Option<Duration>,
    access_budget: Option<NonZeroU64>,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT, DEFAULT_ACCESS_BUDGET)
    }
}

impl Lifetime {
    /// Creates a lifetime from raw values; zero in either position means unbounded.
    pub fn new(timeout: Duration, access_budget: u64) -> Self {
        Self {
            timeout: (!timeout.is_zero()).then_some(timeout),
            access_budget: NonZeroU64::new(access_budget),
        }
    }

    /// A lifetime with neither a timeout nor a read budget.
    pub fn unbounded() -> Self {
        Self {
            timeout: None,
            access_budget: None,
        }
    }

    /// Sets the timeout. `None` removes it.
    pub fn with_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.timeout = timeout.into().filter(|t| !t.is_zero());
        self
    }

    /// Sets the read budget. `None` removes it.
    pub fn with_access_budget(mut self, budget: impl Into<Option<NonZeroU64>>) -> Self {
        self.access_budget = budget.into();
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn access_budget(&self) -> Option<NonZeroU64> {
        self.access_budget
    }

    /// Number of reads an entry created now may serve.
    /// An unbounded budget is represented by `u64::MAX`.
    pub(crate) fn reads(&self) -> u64 {
        self.access_budget.map_or(u64::MAX, NonZeroU64::get)
    }

    /// Deadline of an entry created at `now`, or `None` if it never times out.
    /// A timeout too large to represent is treated as unbounded.
    pub(crate) fn deadline_from(&self, now: Instant) -> Option<Instant> {
        self.timeout.and_then(|timeout| now.checked_add(timeout))
    }
}
