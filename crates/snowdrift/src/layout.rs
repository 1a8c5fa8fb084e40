/// Field widths of a 64-bit packed ID.
///
/// The layout from most- to least-significant bit is
///
/// ```text
///  Bit Index:  63           63 62            .. ..              .. ..            0
///              +--------------+----------------+-----------------+--------------+
///  Field:      | reserved (1) | timestamp      | datacenter      | worker | seq |
///              +--------------+----------------+-----------------+--------------+
/// ```
///
/// where the timestamp occupies whatever the three configured fields leave of
/// the lower 63 bits. With the default 5/5/12 split that is 41 bits of
/// milliseconds, roughly 69 years of range past the base time.
///
/// A layout is pure data: encoding and decoding are deterministic, perform no
/// validation beyond debug assertions, and are safe to call from any thread.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BitLayout {
    datacenter_bits: u8,
    worker_bits: u8,
    seq_bits: u8,
}

impl BitLayout {
    /// Creates a layout from field widths. Widths are taken as-is; range
    /// checking belongs to [`GeneratorOptions::validate`].
    ///
    /// [`GeneratorOptions::validate`]: crate::GeneratorOptions
    pub const fn new(datacenter_bits: u8, worker_bits: u8, seq_bits: u8) -> Self {
        Self {
            datacenter_bits,
            worker_bits,
            seq_bits,
        }
    }

    /// Width of the timestamp field: the lower 63 bits minus the three
    /// configured fields. The top bit stays clear so IDs remain positive when
    /// stored in signed 64-bit columns.
    pub const fn timestamp_bits(&self) -> u8 {
        63 - self.datacenter_bits - self.worker_bits - self.seq_bits
    }

    pub const fn datacenter_bits(&self) -> u8 {
        self.datacenter_bits
    }

    pub const fn worker_bits(&self) -> u8 {
        self.worker_bits
    }

    pub const fn seq_bits(&self) -> u8 {
        self.seq_bits
    }

    /// Number of bits to shift the timestamp to its position.
    pub const fn timestamp_shift(&self) -> u8 {
        self.datacenter_bits + self.worker_bits + self.seq_bits
    }

    /// Number of bits to shift the datacenter id to its position.
    pub const fn datacenter_shift(&self) -> u8 {
        self.worker_bits + self.seq_bits
    }

    /// Number of bits to shift the worker id to its position.
    pub const fn worker_shift(&self) -> u8 {
        self.seq_bits
    }

    /// Maximum value of the timestamp field.
    pub const fn max_timestamp(&self) -> u64 {
        mask(self.timestamp_bits())
    }

    /// Maximum value of the datacenter id field.
    pub const fn max_datacenter_id(&self) -> u64 {
        mask(self.datacenter_bits)
    }

    /// Maximum value of the worker id field.
    pub const fn max_worker_id(&self) -> u64 {
        mask(self.worker_bits)
    }

    /// Maximum value of the sequence field.
    pub const fn max_sequence(&self) -> u64 {
        mask(self.seq_bits)
    }

    /// Packs the four fields into an ID.
    ///
    /// Inputs are expected in range: the strategies only pass values bounded
    /// by a validated configuration.
    pub fn encode(&self, timestamp: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> u64 {
        debug_assert!(timestamp <= self.max_timestamp(), "timestamp overflow");
        debug_assert!(
            datacenter_id <= self.max_datacenter_id(),
            "datacenter_id overflow"
        );
        debug_assert!(worker_id <= self.max_worker_id(), "worker_id overflow");
        debug_assert!(sequence <= self.max_sequence(), "sequence overflow");

        (timestamp & self.max_timestamp()) << self.timestamp_shift()
            | (datacenter_id & self.max_datacenter_id()) << self.datacenter_shift()
            | (worker_id & self.max_worker_id()) << self.worker_shift()
            | (sequence & self.max_sequence())
    }

    /// Unpacks an ID into its fields.
    ///
    /// Total over all of `u64`: an ID produced under a different layout
    /// decodes without panicking, just into meaningless fields.
    pub const fn decode(&self, id: u64) -> IdParts {
        IdParts {
            timestamp: (id >> self.timestamp_shift()) & self.max_timestamp(),
            datacenter_id: (id >> self.datacenter_shift()) & self.max_datacenter_id(),
            worker_id: (id >> self.worker_shift()) & self.max_worker_id(),
            sequence: id & self.max_sequence(),
        }
    }
}

const fn mask(bits: u8) -> u64 {
    (1 << bits) - 1
}

/// The decoded view of a packed ID.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct IdParts {
    /// Milliseconds since the base time at which the ID was minted (virtual
    /// ticks included, for the drift strategy).
    pub timestamp: u64,
    pub datacenter_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}
