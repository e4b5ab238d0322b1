// Package watcher provides the per-entry expiration task.

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

/// Messages an entry's owner can send to its watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Signal {
    /// The read budget reached zero; the watcher must unlink the entry.
    Exhausted,
    /// The owner already unlinked the entry under exclusive access; the watcher
    /// must stop without touching the map.
    Detach,
}

/// Why a watcher expired its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cause {
    Timeout,
    Budget,
}

impl Cause {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cause::Timeout => "timeout",
            Cause::Budget => "budget",
        }
    }
}

/// At most one `Exhausted` and one `Detach` are ever sent per entry,
/// so a send never fails for lack of capacity.
const SIGNAL_CAPACITY: usize = 2;

/// Owner-side handle of a running watcher task.
pub(crate) struct Watcher {
    signal: mpsc::Sender<Signal>,
    handle: JoinHandle<()>,
}

impl Watcher {
    /// Spawns a watcher on `runtime`.
    ///
    /// `on_expire` runs at most once, from the watcher task, when the deadline
    /// elapses or an `Exhausted` signal arrives first. It is never called after
    /// a `Detach` or once every sender is gone.
    pub(crate) fn spawn<F>(runtime: &Handle, deadline: Option<Instant>, on_expire: F) -> Self
    where
        F: FnOnce(Cause) + Send + 'static,
    {
        let (signal, signals) = mpsc::channel(SIGNAL_CAPACITY);
        let handle = runtime.spawn(watch(deadline, signals, on_expire));
        Self { signal, handle }
    }

    /// Asks the watcher to unlink its entry. Never blocks.
    pub(crate) fn exhaust(&self) {
        // The watcher may already have exited on timeout; the entry is gone then.
        let _ = self.signal.try_send(Signal::Exhausted);
    }

    /// Tells the watcher its entry is already unlinked and waits until the task has finished.
    pub(crate) async fn detach(self) {
        let _ = self.signal.try_send(Signal::Detach);
        if let Err(e) = self.handle.await {
            if e.is_panic() {
                tracing::error!(component = "watcher", event = "join_failed", error = %e, "watcher panicked");
            }
        }
    }

    /// Like [`detach`](Self::detach) without waiting; the task exits on its own.
    pub(crate) fn release(self) {
        let _ = self.signal.try_send(Signal::Detach);
    }

    #[cfg(test)]
    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

async fn watch<F>(deadline: Option<Instant>, mut signals: mpsc::Receiver<Signal>, on_expire: F)
where
    F: FnOnce(Cause),
{
    let timer = async {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => std::future::pending().await,
        }
    };

    // Signals are polled first so a pending detach wins over an elapsed timer.
    tokio::select! {
        biased;
        signal = signals.recv() => match signal {
            Some(Signal::Exhausted) => on_expire(Cause::Budget),
            Some(Signal::Detach) => {
                tracing::trace!(component = "watcher", event = "detached", "watcher released");
            }
            None => {
                tracing::trace!(component = "watcher", event = "orphaned", "owner dropped, watcher released");
            }
        },
        _ = timer => on_expire(Cause::Timeout),
    }
}
