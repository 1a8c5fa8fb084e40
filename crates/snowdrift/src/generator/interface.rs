use crate::{BitLayout, Result};

/// A minimal interface over the sequence-advancement strategies.
///
/// Implementations own their `(tick, sequence)` state exclusively and commit
/// every transition atomically (under a mutex or through a CAS), so two calls
/// on the same instance can never observe or produce the same state.
pub trait SnowflakeGenerator {
    /// Generates the next available ID.
    ///
    /// Blocks the calling thread when the strategy must wait for the clock to
    /// advance; all such waits are sub-second.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] when the clock is observed
    /// behind the last committed tick by more than the configured tolerance.
    /// The failed call commits no state transition.
    ///
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    fn next_id(&self) -> Result<u64>;

    /// The bit layout every ID from this generator is packed with.
    fn layout(&self) -> BitLayout;
}
