use core::cmp::Ordering;

use parking_lot::Mutex;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, GeneratorOptions, Result, TimeSource,
    generator::SnowflakeGenerator,
    layout::BitLayout,
    options::ResolvedOptions,
    time::wait_until,
};

struct LockState {
    last_tick: u64,
    sequence: u64,
}

/// A lock-based generator with classic wait-on-exhaustion semantics.
///
/// The `(tick, sequence)` state sits behind a mutex. When the sequence for
/// the current millisecond is exhausted, the call blocks until the clock
/// strictly advances, so the timestamp field of every ID corresponds to real
/// time. The simplest correct baseline of the three strategies.
///
/// ## Recommended When
/// - The timestamp field must track real time exactly
/// - Sustained load stays below one full sequence range per millisecond
///
/// ## See Also
/// - [`DriftSnowflakeGenerator`]
/// - [`AtomicSnowflakeGenerator`]
///
/// [`DriftSnowflakeGenerator`]: crate::generator::DriftSnowflakeGenerator
/// [`AtomicSnowflakeGenerator`]: crate::generator::AtomicSnowflakeGenerator
pub struct LockSnowflakeGenerator<C>
where
    C: TimeSource,
{
    cfg: ResolvedOptions,
    clock: C,
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<LockState>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<LockState>,
}

impl<C> LockSnowflakeGenerator<C>
where
    C: TimeSource,
{
    /// Creates a traditional locked generator from validated options and a
    /// time source.
    ///
    /// The sequence state is seeded from the clock's current tick and
    /// `min_seq`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any option invariant is violated.
    pub fn new(options: &GeneratorOptions, clock: C) -> Result<Self> {
        let cfg = options.validate()?;
        Ok(Self::from_resolved(cfg, clock))
    }

    pub(crate) fn from_resolved(cfg: ResolvedOptions, clock: C) -> Self {
        let state = LockState {
            last_tick: clock.current_millis(),
            sequence: cfg.min_seq,
        };
        Self {
            cfg,
            clock,
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(state),
        }
    }

    /// Generates the next ID, blocking through the end of the current
    /// millisecond when the sequence is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] when the clock sits behind the
    /// last committed tick by more than the configured tolerance. Smaller
    /// backward steps are waited out. The failed call commits nothing.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        let cfg = &self.cfg;

        let mut state = self.state.lock();
        let now = self.clock.current_millis();

        match now.cmp(&state.last_tick) {
            Ordering::Greater => {
                state.last_tick = now;
                state.sequence = cfg.min_seq;
            }
            Ordering::Equal | Ordering::Less => {
                if now < state.last_tick {
                    Self::check_rollback(state.last_tick - now, cfg.rollback_tolerance_ms)?;
                }
                if state.sequence < cfg.max_seq {
                    state.sequence += 1;
                } else {
                    state.last_tick = Self::cold_next_tick(&self.clock, state.last_tick);
                    state.sequence = cfg.min_seq;
                }
            }
        }

        Ok(cfg.layout.encode(
            state.last_tick,
            cfg.datacenter_id,
            cfg.worker_id,
            state.sequence,
        ))
    }

    #[cold]
    #[inline(never)]
    fn check_rollback(deficit: u64, tolerance_ms: u64) -> Result<()> {
        if deficit > tolerance_ms {
            return Err(Error::ClockMovedBackwards { deficit_ms: deficit });
        }
        Ok(())
    }

    /// Sequence exhausted: wait for the clock to strictly pass the last
    /// committed tick.
    #[cold]
    #[inline(never)]
    fn cold_next_tick(clock: &C, last_tick: u64) -> u64 {
        wait_until(clock, last_tick + 1)
    }
}

impl<C> SnowflakeGenerator for LockSnowflakeGenerator<C>
where
    C: TimeSource,
{
    fn next_id(&self) -> Result<u64> {
        self.next_id()
    }

    fn layout(&self) -> BitLayout {
        self.cfg.layout
    }
}
