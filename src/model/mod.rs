// Data models for the managed map.

pub(crate) mod entry;
pub mod lifetime;


// Re-export main types
pub(crate) use entry::{Entry, Read};
pub use lifetime::{Lifetime, DEFAULT_ACCESS_BUDGET, DEFAULT_TIMEOUT};
