use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam_utils::Backoff;

/// Default base time: Thursday, February 20, 2020 02:20:02.020 UTC.
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_582_165_202_020);

/// A source of the current tick: milliseconds elapsed since the configured
/// base time.
///
/// This abstraction lets callers plug in the wall clock, a monotonic timer,
/// or a mocked time source in tests.
///
/// # Example
///
/// ```
/// use snowdrift::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1234
///     }
/// }
///
/// assert_eq!(FixedTime.current_millis(), 1234);
/// ```
pub trait TimeSource {
    /// Returns the current time in milliseconds since the configured base
    /// time.
    fn current_millis(&self) -> u64;
}

/// A wall-clock time source anchored at a base time.
///
/// Each read consults [`SystemTime::now`], so external clock adjustments are
/// visible to the generators, including backward steps, which the sequence
/// strategies guard against. Readings earlier than the base time saturate to
/// tick 0.
#[derive(Clone, Copy, Debug)]
pub struct WallClock {
    epoch_ms: u64,
}

impl Default for WallClock {
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }
}

impl WallClock {
    /// Creates a wall clock whose tick 0 is `epoch` (a [`Duration`] since
    /// 1970-01-01 UTC).
    pub fn with_epoch(epoch: Duration) -> Self {
        Self {
            epoch_ms: epoch.as_millis() as u64,
        }
    }
}

impl TimeSource for WallClock {
    fn current_millis(&self) -> u64 {
        let unix_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64);
        unix_ms.saturating_sub(self.epoch_ms)
    }
}

/// Blocks until `clock` reports a tick of at least `target`, returning the
/// first observed tick that satisfies it.
///
/// Spins with progressively-yielding backoff; all waits in this crate are
/// sub-second in practice, so no sleep coarser than the backoff is needed.
pub(crate) fn wait_until(clock: &impl TimeSource, target: u64) -> u64 {
    let backoff = Backoff::new();
    loop {
        let now = clock.current_millis();
        if now >= target {
            return now;
        }
        backoff.snooze();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_ticks_relative_to_epoch() {
        let clock = WallClock::with_epoch(DEFAULT_EPOCH);
        let tick = clock.current_millis();
        assert!(tick > 0);

        // A clock anchored at the Unix epoch always reads ahead of one
        // anchored at a later base time.
        let unix_anchored = WallClock::with_epoch(Duration::ZERO);
        assert!(unix_anchored.current_millis() > clock.current_millis());
    }

    #[test]
    fn wall_clock_saturates_before_epoch() {
        // Anchor far in the future; the reading must clamp to 0 rather than
        // wrap.
        let future = Duration::from_millis(u64::MAX / 2);
        let clock = WallClock::with_epoch(future);
        assert_eq!(clock.current_millis(), 0);
    }
}
