#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    GeneratorOptions, Method, Result, TimeSource, WallClock,
    generator::{
        AtomicSnowflakeGenerator, DriftSnowflakeGenerator, LockSnowflakeGenerator, OverflowHook,
        SnowflakeGenerator,
    },
    layout::{BitLayout, IdParts},
};

/// The strategy actually constructed for a [`Method`]. The set is closed:
/// a generator is built as exactly one variant and never changes it.
enum Worker<C>
where
    C: TimeSource,
{
    Drift(DriftSnowflakeGenerator<C>),
    Traditional(LockSnowflakeGenerator<C>),
    LockFree(AtomicSnowflakeGenerator<C>),
}

/// A configured ID generator: validated options plus the strategy selected
/// by [`GeneratorOptions::method`].
///
/// This is the type most callers hold: typically one instance per process
/// per (worker, datacenter) assignment, shared behind an `Arc` or installed
/// as the process default via [`init_default`].
///
/// # Example
///
/// ```
/// use snowdrift::{GeneratorOptions, IdGenerator};
///
/// let options = GeneratorOptions {
///     worker_id: 1,
///     ..GeneratorOptions::default()
/// };
/// let generator = IdGenerator::new(&options).unwrap();
///
/// let a = generator.next_id().unwrap();
/// let b = generator.next_id().unwrap();
/// assert!(a < b);
/// assert_eq!(generator.decode(a).worker_id, 1);
/// ```
///
/// [`init_default`]: crate::init_default
pub struct IdGenerator<C = WallClock>
where
    C: TimeSource,
{
    worker: Worker<C>,
}

impl<C> core::fmt::Debug for IdGenerator<C>
where
    C: TimeSource,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let method = match self.worker {
            Worker::Drift(_) => "Drift",
            Worker::Traditional(_) => "Traditional",
            Worker::LockFree(_) => "LockFree",
        };
        f.debug_struct("IdGenerator").field("method", &method).finish()
    }
}

impl IdGenerator<WallClock> {
    /// Constructs a generator driven by the wall clock, anchored at
    /// `options.base_time`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any option invariant is violated; no
    /// strategy is constructed in that case.
    pub fn new(options: &GeneratorOptions) -> Result<Self> {
        Self::with_clock(options, WallClock::with_epoch(options.base_time))
    }
}

impl<C> IdGenerator<C>
where
    C: TimeSource,
{
    /// Constructs a generator driven by an injected time source.
    ///
    /// The clock must report milliseconds since `options.base_time`; the
    /// generator does not re-anchor it.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any option invariant is violated.
    pub fn with_clock(options: &GeneratorOptions, clock: C) -> Result<Self> {
        let cfg = options.validate()?;
        let worker = match options.method {
            Method::Drift => Worker::Drift(DriftSnowflakeGenerator::from_resolved(cfg, clock)),
            Method::Traditional => {
                Worker::Traditional(LockSnowflakeGenerator::from_resolved(cfg, clock))
            }
            Method::LockFree => Worker::LockFree(AtomicSnowflakeGenerator::from_resolved(cfg, clock)),
        };
        Ok(Self { worker })
    }

    /// Generates the next ID via the active strategy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockMovedBackwards`] when the clock is observed
    /// behind the last committed tick by more than the configured tolerance.
    ///
    /// [`Error::ClockMovedBackwards`]: crate::Error::ClockMovedBackwards
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        match &self.worker {
            Worker::Drift(generator) => generator.next_id(),
            Worker::Traditional(generator) => generator.next_id(),
            Worker::LockFree(generator) => generator.next_id(),
        }
    }

    /// Unpacks an ID into its fields under this generator's layout.
    ///
    /// Total over all of `u64`; an ID minted under a different configuration
    /// decodes into meaningless but in-range fields.
    pub fn decode(&self, id: u64) -> IdParts {
        self.layout().decode(id)
    }

    /// The bit layout shared by every ID this generator produces. The
    /// layout depends only on the configured field widths, never on the
    /// selected method.
    pub fn layout(&self) -> BitLayout {
        match &self.worker {
            Worker::Drift(generator) => generator.layout(),
            Worker::Traditional(generator) => generator.layout(),
            Worker::LockFree(generator) => generator.layout(),
        }
    }

    /// The strategy this generator was constructed with.
    pub fn method(&self) -> Method {
        match &self.worker {
            Worker::Drift(_) => Method::Drift,
            Worker::Traditional(_) => Method::Traditional,
            Worker::LockFree(_) => Method::LockFree,
        }
    }

    /// Installs the overflow-notification hook.
    ///
    /// Only the drift strategy emits overflow events; for the other
    /// strategies this is a no-op.
    pub fn set_overflow_hook(&self, hook: OverflowHook) {
        if let Worker::Drift(generator) = &self.worker {
            generator.set_overflow_hook(hook);
        }
    }
}

impl<C> SnowflakeGenerator for IdGenerator<C>
where
    C: TimeSource,
{
    fn next_id(&self) -> Result<u64> {
        self.next_id()
    }

    fn layout(&self) -> BitLayout {
        self.layout()
    }
}
