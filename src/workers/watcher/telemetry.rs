// Package watcher provides periodic telemetry for map lifecycle counters.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

use super::counters::{Counters, Stats};

/// Logs counter deltas every `each` until `shutdown_token` is cancelled.
///
/// `size` reports the current number of entries, or `None` once the map is closed.
pub async fn logger<S>(
    shutdown_token: CancellationToken,
    name: String,
    counters: Arc<Counters>,
    size: S,
    each: Duration,
) where
    S: Fn() -> Option<usize>,
{
    let mut ticker = interval(each);
    // The first tick completes immediately.
    ticker.tick().await;
    let mut last = counters.snapshot();

    loop {
        tokio::select! {
            _ = shutdown_token.cancelled() => {
                tracing::debug!(svc = "telemetry", name = %name, "logger stopped");
                return;
            }
            _ = ticker.tick() => {
                let now = counters.snapshot();
                report(&name, &now.since(&last), size());
                last = now;
            }
        }
    }
}

fn report(name: &str, delta: &Stats, size: Option<usize>) {
    match size {
        Some(len) => tracing::info!(
            name = %name,
            len,
            hits = delta.hits,
            misses = delta.misses,
            inserts = delta.inserts,
            updates = delta.updates,
            expired_timeout = delta.expired_timeout,
            expired_budget = delta.expired_budget,
            removed = delta.removed,
            "managed map stats"
        ),
        None => tracing::debug!(name = %name, "managed map closed, nothing to report"),
    }
}
