//! Concurrent map whose entries expire after a timeout or a number of reads.

use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::time::Instant;

use crate::model::{Entry, Lifetime, Read};
use crate::workers::{Cause, Counters, Stats, Watcher};

use super::error::MapError;

type Entries<K, V> = HashMap<K, Entry<V>>;

/// State shared between map handles and watcher tasks.
struct Shared<K, V> {
    /// `None` once the map is closed.
    entries: RwLock<Option<Entries<K, V>>>,
    next_id: AtomicU64,
    counters: Arc<Counters>,
}

impl<K: Eq + Hash, V> Shared<K, V> {
    /// Unlinks `key` only if it still holds the entry tagged `id`.
    /// A late notification for a key that was removed, or removed and
    /// inserted again, is therefore a no-op.
    fn unlink(entries: &mut Entries<K, V>, key: &K, id: u64) -> Option<Entry<V>> {
        if entries.get(key)?.id() != id {
            return None;
        }
        entries.remove(key)
    }

    /// Called from a watcher task when the entry's deadline elapsed or its budget ran out.
    fn expire(&self, key: &K, id: u64, cause: Cause) {
        let unlinked = {
            let mut state = self.entries.write();
            state.as_mut().and_then(|entries| Self::unlink(entries, key, id))
        };
        if unlinked.is_some() {
            self.counters.expired(cause);
            tracing::trace!(component = "managedmap", event = "expired", cause = cause.as_str(), id, "entry expired");
        }
    }
}

/// Thread-safe key-value map whose entries remove themselves after a timeout
/// and/or a number of successful reads, whichever comes first.
///
/// Every entry is watched by its own task on the tokio runtime the map was
/// created on. Reads and writes are synchronous and may be called from any
/// thread; [`remove`](Self::remove) and [`close`](Self::close) are async
/// because they wait for the affected watchers to finish.
///
/// Handles are cheap to clone and all point to the same map.
///
/// # Example
///
/// ```rust,no_run
/// use managedmap::{Lifetime, ManagedMap};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), managedmap::MapError> {
///     // Default lifetime: 24h timeout, a single read.
///     let map = ManagedMap::new();
///     map.put("k", 2)?;
///     assert_eq!(map.get("k")?, Some(2));
///     assert_eq!(map.get("k")?, None);
///
///     // Three reads or one minute.
///     map.put_custom("token", 7, Lifetime::new(Duration::from_secs(60), 3))?;
///
///     map.close().await
/// }
/// ```
pub struct ManagedMap<K, V> {
    shared: Arc<Shared<K, V>>,
    lifetime: Lifetime,
    runtime: Handle,
}

impl<K, V> Clone for ManagedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            lifetime: self.lifetime,
            runtime: self.runtime.clone(),
        }
    }
}

impl<K, V> ManagedMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a map with the default lifetime (24 hours, one read).
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context. Use
    /// [`with_handle`](Self::with_handle) to pick the runtime explicitly.
    pub fn new() -> Self {
        Self::with_lifetime(Lifetime::default())
    }

    /// Creates a map whose entries get `lifetime` unless a write overrides it.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime context.
    pub fn with_lifetime(lifetime: Lifetime) -> Self {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => panic!(
                "managedmap::ManagedMap requires a Tokio runtime. \
                 Create it from within a runtime context or use ManagedMap::with_handle()."
            ),
        };
        Self::with_handle(lifetime, runtime)
    }

    /// Creates a map whose watchers run on `runtime`.
    pub fn with_handle(lifetime: Lifetime, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: RwLock::new(Some(HashMap::new())),
                next_id: AtomicU64::new(0),
                counters: Arc::new(Counters::new()),
            }),
            lifetime,
            runtime,
        }
    }

    /// Lifetime applied by [`put`](Self::put).
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Reads a value, spending one read of its budget.
    ///
    /// Returns `Ok(None)` if the key is absent, timed out, or its budget is spent,
    /// even when the entry has not been physically removed yet. The read that
    /// spends the last unit of budget schedules the removal and returns at once.
    pub fn get<Q>(&self, key: &Q) -> Result<Option<V>, MapError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let state = self.shared.entries.read();
        let entries = state.as_ref().ok_or(MapError::Closed)?;

        let now = Instant::now();
        let Some(entry) = entries.get(key).filter(|entry| entry.is_live(now)) else {
            self.shared.counters.miss();
            return Ok(None);
        };

        match entry.consume() {
            Read::Denied => {
                self.shared.counters.miss();
                Ok(None)
            }
            Read::Granted => {
                self.shared.counters.hit();
                Ok(Some(entry.value().clone()))
            }
            Read::Last => {
                entry.watcher().exhaust();
                self.shared.counters.hit();
                Ok(Some(entry.value().clone()))
            }
        }
    }

    /// Checks whether a read would currently find the key. Does not spend budget.
    pub fn has<Q>(&self, key: &Q) -> Result<bool, MapError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let state = self.shared.entries.read();
        let entries = state.as_ref().ok_or(MapError::Closed)?;
        let now = Instant::now();
        Ok(entries.get(key).is_some_and(|entry| entry.is_live(now)))
    }

    /// Inserts a value with the map's default lifetime.
    ///
    /// Writing a key that is already live replaces only its value: the
    /// remaining budget and the deadline are kept.
    pub fn put(&self, key: K, value: V) -> Result<(), MapError> {
        self.put_custom(key, value, self.lifetime)
    }

    /// Inserts a value with its own lifetime.
    ///
    /// `lifetime` only applies if the key is not live; writing a live key
    /// replaces its value and keeps its budget and deadline.
    pub fn put_custom(&self, key: K, value: V, lifetime: Lifetime) -> Result<(), MapError> {
        let now = Instant::now();
        let mut state = self.shared.entries.write();
        let entries = state.as_mut().ok_or(MapError::Closed)?;

        if let Some(entry) = entries.get_mut(&key).filter(|entry| entry.is_live(now)) {
            entry.replace(value);
            self.shared.counters.updates.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        }

        // Dead but not yet unlinked by its watcher: take it out now.
        let stale_id = entries.get(&key).map(Entry::id);
        if let Some(stale) = stale_id.and_then(|id| Shared::unlink(entries, &key, id)) {
            let cause = if stale.remaining() == 0 { Cause::Budget } else { Cause::Timeout };
            self.shared.counters.expired(cause);
            stale.into_watcher().release();
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = lifetime.deadline_from(now);
        let watcher = Watcher::spawn(&self.runtime, deadline, self.expiry_hook(key.clone(), id));
        entries.insert(key, Entry::new(id, value, lifetime.reads(), deadline, watcher));
        self.shared.counters.inserts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Removes a key and waits until its watcher has stopped.
    ///
    /// The entry is gone from the map when this returns. Removing an absent or
    /// expired key is a no-op.
    pub async fn remove<Q>(&self, key: &Q) -> Result<(), MapError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let unlinked = {
            let mut state = self.shared.entries.write();
            let entries = state.as_mut().ok_or(MapError::Closed)?;
            entries.remove(key)
        };

        if let Some(entry) = unlinked {
            self.shared.counters.removed.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(component = "managedmap", event = "removed", id = entry.id(), "entry removed");
            entry.into_watcher().detach().await;
        }
        Ok(())
    }

    /// Number of entries currently held.
    ///
    /// This is an upper bound of the live entries: an entry whose last read
    /// was just spent is counted until its watcher unlinks it.
    pub fn size(&self) -> Result<usize, MapError> {
        let state = self.shared.entries.read();
        state.as_ref().map(HashMap::len).ok_or(MapError::Closed)
    }

    /// Closes the map: every entry is dropped and every watcher has stopped
    /// when this returns. Any later call, including another `close`, fails
    /// with [`MapError::Closed`].
    pub async fn close(&self) -> Result<(), MapError> {
        let entries = {
            let mut state = self.shared.entries.write();
            state.take().ok_or(MapError::Closed)?
        };

        let count = entries.len();
        futures::future::join_all(
            entries
                .into_values()
                .map(|entry| entry.into_watcher().detach()),
        )
        .await;

        tracing::info!(component = "managedmap", event = "closed", entries = count, "managed map closed");
        Ok(())
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.entries.read().is_none()
    }

    /// Snapshot of the lifecycle counters.
    pub fn stats(&self) -> Stats {
        self.shared.counters.snapshot()
    }

    /// Live counters, e.g. for a telemetry logger.
    pub fn counters(&self) -> Arc<Counters> {
        Arc::clone(&self.shared.counters)
    }

    /// Number of watcher tasks still holding on to this map.
    #[cfg(test)]
    pub(crate) fn watcher_refs(&self) -> usize {
        Arc::weak_count(&self.shared)
    }

    fn expiry_hook(&self, key: K, id: u64) -> impl FnOnce(Cause) + Send + 'static {
        let shared = Arc::downgrade(&self.shared);
        move |cause| {
            if let Some(shared) = shared.upgrade() {
                shared.expire(&key, id, cause);
            }
        }
    }
}

impl<K, V> Default for ManagedMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
