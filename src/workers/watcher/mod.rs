//! Per-entry expiration watchers.

pub mod counters;
pub mod telemetry;
pub(crate) mod watcher;

// Re-export main types
pub use counters::{Counters, Stats};
pub use watcher::Cause;
pub(crate) use watcher::Watcher;
