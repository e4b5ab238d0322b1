//! Managed map storage.

pub mod error;
pub mod map;


// Re-export main types
pub use error::MapError;
pub use map::ManagedMap;
