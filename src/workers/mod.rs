// Background workers of the managed map.

pub mod watcher;

// Re-export main types
pub use watcher::{Cause, Counters, Stats};
pub(crate) use watcher::Watcher;
