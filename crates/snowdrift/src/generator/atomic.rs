use core::time::Duration;
use std::thread;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, GeneratorOptions, Result, TimeSource,
    generator::SnowflakeGenerator,
    layout::BitLayout,
    options::ResolvedOptions,
    time::wait_until,
};

/// A lock-free generator committing transitions through one atomic word.
///
/// The `(tick, sequence)` pair is packed as `(tick << seq_bits) | sequence`
/// into a single [`AtomicU64`] and advanced with a compare-and-swap retry
/// loop: a losing caller re-reads and recomputes instead of waiting on a
/// lock. The clock is consulted only when the sequence is exhausted; the
/// exhausted caller spins (with progressive backoff) until the next
/// millisecond, without blocking concurrent callers from retrying.
///
/// ## Recommended When
/// - Many threads share one instance and fairness is worth trading for
///   throughput
///
/// ## See Also
/// - [`DriftSnowflakeGenerator`]
/// - [`LockSnowflakeGenerator`]
///
/// [`DriftSnowflakeGenerator`]: crate::generator::DriftSnowflakeGenerator
/// [`LockSnowflakeGenerator`]: crate::generator::LockSnowflakeGenerator
pub struct AtomicSnowflakeGenerator<C>
where
    C: TimeSource,
{
    cfg: ResolvedOptions,
    clock: C,
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
}

impl<C> AtomicSnowflakeGenerator<C>
where
    C: TimeSource,
{
    /// Creates a lock-free generator from validated options and a time
    /// source.
    ///
    /// The state word is seeded from the clock's current tick and `min_seq`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any option invariant is violated.
    pub fn new(options: &GeneratorOptions, clock: C) -> Result<Self> {
        let cfg = options.validate()?;
        Ok(Self::from_resolved(cfg, clock))
    }

    pub(crate) fn from_resolved(cfg: ResolvedOptions, clock: C) -> Self {
        let initial = clock.current_millis() << cfg.layout.seq_bits() | cfg.min_seq;
        Self {
            cfg,
            clock,
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial),
        }
    }

    /// Generates the next ID via the CAS retry loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] when, upon exhaustion, the
    /// clock sits behind the committed tick by more than the configured
    /// tolerance. Smaller backward steps are slept off. A failed call
    /// commits nothing; concurrent callers are unaffected.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        let cfg = &self.cfg;
        let seq_bits = cfg.layout.seq_bits();
        let seq_mask = cfg.layout.max_sequence();

        loop {
            let current = self.state.load(Ordering::Relaxed);
            let last_tick = current >> seq_bits;
            let last_seq = current & seq_mask;

            let (tick, sequence) = if last_seq < cfg.max_seq {
                (last_tick, last_seq + 1)
            } else {
                (self.next_tick(last_tick)?, cfg.min_seq)
            };

            let next = tick << seq_bits | sequence;
            if self
                .state
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return Ok(cfg
                    .layout
                    .encode(tick, cfg.datacenter_id, cfg.worker_id, sequence));
            }

            // Lost the race. Nothing was committed, so a retry from a fresh
            // read is free.
            core::hint::spin_loop();
        }
    }

    /// Sequence exhausted: find the first tick strictly after `last_tick`.
    #[cold]
    #[inline(never)]
    fn next_tick(&self, last_tick: u64) -> Result<u64> {
        let now = self.clock.current_millis();
        if now < last_tick {
            let deficit = last_tick - now;
            if deficit > self.cfg.rollback_tolerance_ms {
                return Err(Error::ClockMovedBackwards { deficit_ms: deficit });
            }
            // Tolerated backward step: sleep it off, then wait out whatever
            // remains of the tick.
            thread::sleep(Duration::from_millis(deficit + 1));
        }
        Ok(wait_until(&self.clock, last_tick + 1))
    }
}

impl<C> SnowflakeGenerator for AtomicSnowflakeGenerator<C>
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
