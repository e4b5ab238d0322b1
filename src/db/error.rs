//! Managed map errors.

/// Precondition violations of the managed map.
///
/// Absent or expired keys are not errors; they are reported as `Ok(None)` / `Ok(false)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    /// The map was closed; it accepts no further operations, including another close.
    #[error("managed map is closed")]
    Closed,
}
