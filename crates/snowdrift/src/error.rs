/// Result alias used across the crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All error variants that `snowdrift` can emit.
///
/// Configuration variants are produced at construction time only; once a
/// generator exists, the sole runtime failure is [`Error::ClockMovedBackwards`],
/// which is fatal to the failing call but leaves the instance usable.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The non-timestamp fields must leave room for a >= 41-bit timestamp.
    #[error(
        "bit budget exceeded: datacenter ({datacenter_bits}) + worker ({worker_bits}) + sequence ({seq_bits}) bits must not exceed 22"
    )]
    BitBudgetExceeded {
        datacenter_bits: u8,
        worker_bits: u8,
        seq_bits: u8,
    },

    /// The sequence field width is outside `1..=12`.
    #[error("sequence bit length {seq_bits} out of range; expected 1..=12")]
    SeqBitsOutOfRange { seq_bits: u8 },

    /// The worker field width is outside `1..=20`.
    #[error("worker bit length {worker_bits} out of range; expected 1..=20")]
    WorkerBitsOutOfRange { worker_bits: u8 },

    /// The datacenter field width is outside `1..=20`.
    #[error("datacenter bit length {datacenter_bits} out of range; expected 1..=20")]
    DataCenterBitsOutOfRange { datacenter_bits: u8 },

    /// The worker id does not fit in the configured worker field.
    #[error("worker id {worker_id} out of range; expected 0..={max}")]
    WorkerIdOutOfRange { worker_id: u64, max: u64 },

    /// The datacenter id does not fit in the configured datacenter field.
    #[error("datacenter id {datacenter_id} out of range; expected 0..={max}")]
    DataCenterIdOutOfRange { datacenter_id: u64, max: u64 },

    /// `min_seq..=max_seq` is empty or exceeds the sequence field capacity.
    #[error("sequence range [{min_seq}, {max_seq}] invalid; expected 0 <= min <= max <= {cap}")]
    SequenceRangeInvalid { min_seq: u64, max_seq: u64, cap: u64 },

    /// The base time lies in the future or more than ~50 years in the past.
    #[error("base time out of range; it must not be in the future nor more than 50 years in the past")]
    BaseTimeOutOfRange,

    /// The clock was observed behind the last committed tick by more than the
    /// configured tolerance. The failing call committed no state; later calls
    /// may succeed once the clock catches up.
    #[error("clock moved backwards; refusing to generate ids for {deficit_ms} ms")]
    ClockMovedBackwards { deficit_ms: u64 },

    /// [`init_default`] was called twice.
    ///
    /// [`init_default`]: crate::init_default
    #[error("default generator is already initialized")]
    AlreadyInitialized,

    /// [`default_generator`] was called before [`init_default`].
    ///
    /// [`default_generator`]: crate::default_generator
    /// [`init_default`]: crate::init_default
    #[error("default generator is not initialized")]
    NotInitialized,
}

impl Error {
    /// Returns true for errors that can only be produced while validating a
    /// [`GeneratorOptions`].
    ///
    /// [`GeneratorOptions`]: crate::GeneratorOptions
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            Self::ClockMovedBackwards { .. } | Self::AlreadyInitialized | Self::NotInitialized
        )
    }
}
