use core::cmp::Ordering;
use std::sync::Arc;

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

/// Payload delivered to the overflow hook each time the drift strategy
/// borrows a virtual tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverflowEvent {
    /// The borrowed tick, not yet reached by the clock.
    pub tick: u64,
    /// The sequence value the new tick restarts from.
    pub sequence: u64,
}

/// Caller-supplied observer for [`OverflowEvent`]s. Purely observational: it
/// runs outside the generator's critical section and its return value is
/// ignored.
pub type OverflowHook = Arc<dyn Fn(OverflowEvent) + Send + Sync>;

struct DriftState {
    last_tick: u64,
    sequence: u64,
    over_cost: u32,
}

/// A lock-based generator that drifts ahead of the clock instead of blocking.
///
/// When the sequence for the current millisecond is exhausted, the tick is
/// advanced *virtually* (one millisecond the clock has not reached yet) and
/// the sequence restarts, so bursty callers keep minting without waiting.
/// Real time is compared against the borrowed tick on every later call and
/// reclaims it as soon as it catches up. The number of outstanding borrows is
/// capped by [`GeneratorOptions::over_cost_ceiling`]; past the cap the
/// generator falls back to blocking until the clock advances.
///
/// ## Recommended When
/// - Peak throughput matters more than the timestamp field tracking real
///   time exactly
/// - You want to observe exhaustion bursts via the overflow hook
///
/// ## See Also
/// - [`LockSnowflakeGenerator`]
/// - [`AtomicSnowflakeGenerator`]
///
/// [`LockSnowflakeGenerator`]: crate::generator::LockSnowflakeGenerator
/// [`AtomicSnowflakeGenerator`]: crate::generator::AtomicSnowflakeGenerator
pub struct DriftSnowflakeGenerator<C>
where
    C: TimeSource,
{
    cfg: ResolvedOptions,
    clock: C,
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<DriftState>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<DriftState>,
    hook: Mutex<Option<OverflowHook>>,
}

impl<C> DriftSnowflakeGenerator<C>
where
    C: TimeSource,
{
    /// Creates a drift generator from validated options and a time source.
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
        let state = DriftState {
            last_tick: clock.current_millis(),
            sequence: cfg.min_seq,
            over_cost: 0,
        };
        Self {
            cfg,
            clock,
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(Mutex::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Mutex::new(state),
            hook: Mutex::new(None),
        }
    }

    /// Installs the overflow hook, replacing any previous one.
    pub fn set_overflow_hook(&self, hook: OverflowHook) {
        *self.hook.lock() = Some(hook);
    }

    /// Generates the next ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] when the clock sits behind the
    /// last committed tick by more than the configured tolerance (plus the
    /// current virtual lead). The failed call commits nothing; the instance
    /// stays usable.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        let (id, event) = self.advance()?;

        // Hook delivery happens after the state guard is gone; a slow hook
        // must not extend the critical section.
        if let Some(event) = event {
            let hook = self.hook.lock().clone();
            if let Some(hook) = hook {
                hook(event);
            }
        }

        Ok(id)
    }

    fn advance(&self) -> Result<(u64, Option<OverflowEvent>)> {
        let cfg = &self.cfg;
        let mut event = None;

        let mut state = self.state.lock();
        let now = self.clock.current_millis();

        match now.cmp(&state.last_tick) {
            Ordering::Greater => {
                // The clock passed every borrowed tick: fully resynchronized.
                state.last_tick = now;
                state.sequence = cfg.min_seq;
                state.over_cost = 0;
            }
            Ordering::Equal | Ordering::Less => {
                if now < state.last_tick {
                    Self::check_rollback(
                        state.last_tick - now,
                        cfg.rollback_tolerance_ms,
                        state.over_cost,
                    )?;
                }
                if state.sequence < cfg.max_seq {
                    state.sequence += 1;
                } else {
                    state.over_cost += 1;
                    if state.over_cost <= cfg.over_cost_ceiling {
                        // Borrow the next millisecond before the clock gets
                        // there. Later calls compare real time against this
                        // tick.
                        state.last_tick += 1;
                        state.sequence = cfg.min_seq;
                        event = Some(OverflowEvent {
                            tick: state.last_tick,
                            sequence: state.sequence,
                        });
                    } else {
                        state.last_tick = Self::cold_resync(&self.clock, state.last_tick);
                        state.sequence = cfg.min_seq;
                        state.over_cost = 0;
                    }
                }
            }
        }

        let id = cfg.layout.encode(
            state.last_tick,
            cfg.datacenter_id,
            cfg.worker_id,
            state.sequence,
        );
        Ok((id, event))
    }

    #[cold]
    #[inline(never)]
    fn check_rollback(deficit: u64, tolerance_ms: u64, over_cost: u32) -> Result<()> {
        // A drifted instance legitimately sits up to one millisecond ahead
        // per recorded borrow; only the excess counts as rollback.
        if deficit > tolerance_ms + u64::from(over_cost) {
            return Err(Error::ClockMovedBackwards { deficit_ms: deficit });
        }
        Ok(())
    }

    /// Over-cost ceiling reached: stop borrowing and wait for the clock to
    /// strictly pass the last committed tick.
    #[cold]
    #[inline(never)]
    fn cold_resync(clock: &C, last_tick: u64) -> u64 {
        wait_until(clock, last_tick + 1)
    }
}

impl<C> SnowflakeGenerator for DriftSnowflakeGenerator<C>
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
