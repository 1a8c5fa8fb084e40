use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::{DEFAULT_EPOCH, TimeSource};

/// Shared ticker state updated once per millisecond.
struct TickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source: elapsed time since construction, offset so that
/// tick 0 falls on a caller-chosen base time.
///
/// Unlike [`WallClock`], readings never go backward: NTP steps and other
/// wall-clock adjustments after construction are invisible. A background
/// thread advances a shared atomic counter once per millisecond from an
/// [`Instant`], so reads on the generation hot path are a single relaxed
/// load with no syscall. The ticker thread exits when the last clone of the
/// clock is dropped.
///
/// [`WallClock`]: crate::WallClock
#[derive(Clone)]
pub struct MonotonicClock {
    inner: Arc<TickerInner>,
    epoch_offset: u64,
}

impl Default for MonotonicClock {
    /// Constructs a monotonic clock aligned to [`DEFAULT_EPOCH`].
    fn default() -> Self {
        Self::with_epoch(DEFAULT_EPOCH)
    }
}

impl MonotonicClock {
    /// Constructs a monotonic clock whose tick 0 is `epoch` (a [`Duration`]
    /// since 1970-01-01 UTC). The offset between the system clock and the
    /// epoch is captured once, at construction.
    ///
    /// # Panics
    ///
    /// Panics if the current system time is earlier than `epoch`.
    pub fn with_epoch(epoch: Duration) -> Self {
        let start = Instant::now();
        let system_now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH");
        let offset = system_now
            .checked_sub(epoch)
            .expect("system clock before base time")
            .as_millis() as u64;

        let inner = Arc::new(TickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let weak_inner = Arc::downgrade(&inner);
        let handle = thread::spawn(move || {
            let mut tick = 0;

            loop {
                // The ticker holds no strong reference; a failed upgrade
                // means every clock handle is gone and the thread can exit.
                let Some(inner_ref) = weak_inner.upgrade() else {
                    break;
                };

                let target = start + Duration::from_millis(tick);
                let now = Instant::now();
                if now < target {
                    thread::sleep(target - now);
                }

                let now_ms = start.elapsed().as_millis() as u64;
                inner_ref.current.store(now_ms, Ordering::Relaxed);

                tick = now_ms + 1;
            }
        });

        inner
            ._handle
            .set(handle)
            .expect("ticker thread already set");

        Self {
            inner,
            epoch_offset: offset,
        }
    }
}

impl TimeSource for MonotonicClock {
    /// Milliseconds since the configured epoch, measured by monotonic
    /// elapsed time since construction.
    fn current_millis(&self) -> u64 {
        self.epoch_offset + self.inner.current.load(Ordering::Relaxed)
    }
}
