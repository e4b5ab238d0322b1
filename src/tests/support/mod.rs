// Shared test support code.
// This module provides common utilities that all test files can use.

use std::hash::Hash;
use std::time::Duration;

use crate::{Lifetime, ManagedMap};

/// Installs a test-friendly subscriber once; later calls are no-ops.
pub fn init_test_logger() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Lifetime with a timeout and no read budget.
pub fn timeout_only(timeout: Duration) -> Lifetime {
    Lifetime::unbounded().with_timeout(timeout)
}

/// Lifetime with a read budget and no timeout.
pub fn budget_only(reads: u64) -> Lifetime {
    Lifetime::new(Duration::ZERO, reads)
}

/// Waits until watchers have brought the map down to `expected` entries.
/// Returns the last observed size.
pub async fn settle<K, V>(map: &ManagedMap<K, V>, expected: usize) -> usize
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    for _ in 0..1_000 {
        match map.size() {
            Ok(size) if size == expected => return size,
            Ok(_) => tokio::time::sleep(Duration::from_millis(1)).await,
            Err(_) => return 0,
        }
    }
    map.size().unwrap_or_default()
}
