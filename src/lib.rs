//! # managedmap
//!
//! A concurrent key-value map whose entries expire on their own after a
//! time-to-live and/or a number of successful reads, whichever comes first.
//!
//! - Reads take shared access and spend one unit of an atomic read budget
//! - Each entry is watched by its own tokio task racing its deadline
//!   against an explicit removal signal
//! - `remove` and `close` wait for the affected watchers before returning
//! - Zero in a lifetime means unbounded
//!
//! ```rust,no_run
//! use managedmap::{Lifetime, ManagedMap};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), managedmap::MapError> {
//!     let map = ManagedMap::with_lifetime(Lifetime::new(Duration::from_millis(5), 0));
//!     map.put(12, "x")?;
//!     assert_eq!(map.get(&12)?, Some("x"));
//!
//!     tokio::time::sleep(Duration::from_millis(6)).await;
//!     assert_eq!(map.get(&12)?, None);
//!
//!     map.close().await
//! }
//! ```

#[cfg(test)]
mod tests;

#[cfg(test)]
pub use tests::support;

pub mod config;
pub mod db;
pub mod model;
pub mod shutdown;
pub mod soak;
pub mod workers;

pub use db::{ManagedMap, MapError};
pub use model::{Lifetime, DEFAULT_ACCESS_BUDGET, DEFAULT_TIMEOUT};
pub use workers::{Cause, Counters, Stats};
