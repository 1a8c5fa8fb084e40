use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{BitLayout, Error, Result, DEFAULT_EPOCH};

/// Oldest accepted base time, relative to now. Keeps the timestamp field from
/// starting life half-exhausted.
const MAX_BASE_TIME_AGE: Duration = Duration::from_secs(50 * 31_557_600);

/// Sequence-advancement strategy of a generator.
///
/// The set is closed and chosen once at construction; it cannot be swapped on
/// a live generator.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Method {
    /// Lock-based; on sequence exhaustion the tick drifts ahead of the clock
    /// (up to [`GeneratorOptions::over_cost_ceiling`]) instead of blocking.
    #[default]
    Drift,
    /// Lock-based; on sequence exhaustion the call blocks until the next
    /// millisecond.
    Traditional,
    /// Lock-free; state transitions commit through a single atomic word and
    /// contention resolves by CAS retry.
    LockFree,
}

impl Method {
    /// Maps the wire-level method tags (1 = drift, 2 = traditional,
    /// 3 = lock-free). Unrecognized tags select [`Method::Drift`].
    pub fn from_code(code: u16) -> Self {
        match code {
            2 => Self::Traditional,
            3 => Self::LockFree,
            _ => Self::Drift,
        }
    }
}

/// Configuration of an ID generator.
///
/// A plain value: populate it in code or deserialize it from an external
/// source (with the `serde` feature), then hand it to a generator
/// constructor, which validates it. All invariants are enforced at
/// construction; generation itself never revisits them.
///
/// # Example
///
/// ```
/// use snowdrift::{GeneratorOptions, IdGenerator, Method};
///
/// let options = GeneratorOptions {
///     worker_id: 7,
///     datacenter_id: 5,
///     method: Method::LockFree,
///     ..GeneratorOptions::default()
/// };
/// let generator = IdGenerator::new(&options).unwrap();
/// let id = generator.next_id().unwrap();
/// assert_eq!(generator.decode(id).worker_id, 7);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Sequence-advancement strategy.
    pub method: Method,
    /// Base time as a duration since 1970-01-01 UTC; tick 0 of every
    /// generated ID. Must not be in the future nor more than ~50 years in
    /// the past.
    pub base_time: Duration,
    /// Worker (machine) identifier, unique per producer within a datacenter.
    pub worker_id: u64,
    /// Datacenter identifier.
    pub datacenter_id: u64,
    /// Width of the worker id field, `1..=20`.
    pub worker_bits: u8,
    /// Width of the datacenter id field, `1..=20`.
    pub datacenter_bits: u8,
    /// Width of the per-millisecond sequence field, `1..=12`.
    pub seq_bits: u8,
    /// First sequence value minted in each millisecond.
    pub min_seq: u64,
    /// Last sequence value minted in each millisecond; `0` derives the field
    /// capacity `2^seq_bits - 1`.
    pub max_seq: u64,
    /// Drift strategy only: how many virtual ticks may be borrowed ahead of
    /// the clock before falling back to blocking.
    pub over_cost_ceiling: u32,
    /// Largest observed backward clock step that is waited out rather than
    /// reported as [`Error::ClockMovedBackwards`].
    pub rollback_tolerance_ms: u64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            method: Method::Drift,
            base_time: DEFAULT_EPOCH,
            worker_id: 0,
            datacenter_id: 0,
            worker_bits: 5,
            datacenter_bits: 5,
            seq_bits: 12,
            min_seq: 0,
            max_seq: 0,
            over_cost_ceiling: 2000,
            rollback_tolerance_ms: 1000,
        }
    }
}

impl GeneratorOptions {
    /// Checks every configuration invariant and resolves derived values.
    ///
    /// # Errors
    ///
    /// Returns the configuration variant of [`Error`] naming the first
    /// violated invariant.
    pub(crate) fn validate(&self) -> Result<ResolvedOptions> {
        if !(1..=12).contains(&self.seq_bits) {
            return Err(Error::SeqBitsOutOfRange {
                seq_bits: self.seq_bits,
            });
        }
        if !(1..=20).contains(&self.worker_bits) {
            return Err(Error::WorkerBitsOutOfRange {
                worker_bits: self.worker_bits,
            });
        }
        if !(1..=20).contains(&self.datacenter_bits) {
            return Err(Error::DataCenterBitsOutOfRange {
                datacenter_bits: self.datacenter_bits,
            });
        }
        if self.datacenter_bits + self.worker_bits + self.seq_bits > 22 {
            return Err(Error::BitBudgetExceeded {
                datacenter_bits: self.datacenter_bits,
                worker_bits: self.worker_bits,
                seq_bits: self.seq_bits,
            });
        }

        let layout = BitLayout::new(self.datacenter_bits, self.worker_bits, self.seq_bits);

        if self.worker_id > layout.max_worker_id() {
            return Err(Error::WorkerIdOutOfRange {
                worker_id: self.worker_id,
                max: layout.max_worker_id(),
            });
        }
        if self.datacenter_id > layout.max_datacenter_id() {
            return Err(Error::DataCenterIdOutOfRange {
                datacenter_id: self.datacenter_id,
                max: layout.max_datacenter_id(),
            });
        }

        let cap = layout.max_sequence();
        let max_seq = if self.max_seq == 0 { cap } else { self.max_seq };
        if self.min_seq > max_seq || max_seq > cap {
            return Err(Error::SequenceRangeInvalid {
                min_seq: self.min_seq,
                max_seq,
                cap,
            });
        }

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        if self.base_time > now || now - self.base_time > MAX_BASE_TIME_AGE {
            return Err(Error::BaseTimeOutOfRange);
        }

        Ok(ResolvedOptions {
            layout,
            base_time: self.base_time,
            worker_id: self.worker_id,
            datacenter_id: self.datacenter_id,
            min_seq: self.min_seq,
            max_seq,
            over_cost_ceiling: self.over_cost_ceiling,
            rollback_tolerance_ms: self.rollback_tolerance_ms,
        })
    }
}

/// A validated configuration with derived values filled in. Everything the
/// strategies read at generation time lives here.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ResolvedOptions {
    pub(crate) layout: BitLayout,
    #[allow(dead_code)]
    pub(crate) base_time: Duration,
    pub(crate) worker_id: u64,
    pub(crate) datacenter_id: u64,
    pub(crate) min_seq: u64,
    pub(crate) max_seq: u64,
    pub(crate) over_cost_ceiling: u32,
    pub(crate) rollback_tolerance_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_validate() {
        let resolved = GeneratorOptions::default().validate().unwrap();
        assert_eq!(resolved.layout.seq_bits(), 12);
        // max_seq == 0 derives the field capacity.
        assert_eq!(resolved.max_seq, 4095);
        assert_eq!(resolved.min_seq, 0);
    }

    #[test]
    fn worker_id_one_past_max_is_rejected() {
        let options = GeneratorOptions {
            worker_id: 1 << 5,
            ..GeneratorOptions::default()
        };
        let err = options.validate().unwrap_err();
        assert_eq!(
            err,
            Error::WorkerIdOutOfRange {
                worker_id: 32,
                max: 31
            }
        );
        assert!(err.is_configuration());
    }

    #[test]
    fn datacenter_id_must_fit_field() {
        let options = GeneratorOptions {
            datacenter_bits: 2,
            datacenter_id: 4,
            ..GeneratorOptions::default()
        };
        assert_eq!(
            options.validate().unwrap_err(),
            Error::DataCenterIdOutOfRange {
                datacenter_id: 4,
                max: 3
            }
        );
    }

    #[test]
    fn bit_budget_is_enforced() {
        let options = GeneratorOptions {
            worker_bits: 6,
            datacenter_bits: 5,
            seq_bits: 12,
            ..GeneratorOptions::default()
        };
        assert!(matches!(
            options.validate().unwrap_err(),
            Error::BitBudgetExceeded { .. }
        ));
    }

    #[test]
    fn seq_bits_bounds() {
        for seq_bits in [0, 13] {
            let options = GeneratorOptions {
                seq_bits,
                ..GeneratorOptions::default()
            };
            assert_eq!(
                options.validate().unwrap_err(),
                Error::SeqBitsOutOfRange { seq_bits }
            );
        }
    }

    #[test]
    fn sequence_range_must_be_ordered_and_capped() {
        let inverted = GeneratorOptions {
            min_seq: 10,
            max_seq: 5,
            ..GeneratorOptions::default()
        };
        assert!(matches!(
            inverted.validate().unwrap_err(),
            Error::SequenceRangeInvalid { .. }
        ));

        let over_cap = GeneratorOptions {
            seq_bits: 4,
            max_seq: 16,
            ..GeneratorOptions::default()
        };
        assert_eq!(
            over_cap.validate().unwrap_err(),
            Error::SequenceRangeInvalid {
                min_seq: 0,
                max_seq: 16,
                cap: 15
            }
        );
    }

    #[test]
    fn base_time_window() {
        let future = GeneratorOptions {
            base_time: Duration::from_millis(u64::MAX / 4),
            ..GeneratorOptions::default()
        };
        assert_eq!(future.validate().unwrap_err(), Error::BaseTimeOutOfRange);

        let ancient = GeneratorOptions {
            base_time: Duration::ZERO,
            ..GeneratorOptions::default()
        };
        assert_eq!(ancient.validate().unwrap_err(), Error::BaseTimeOutOfRange);
    }

    #[test]
    fn method_codes_map_like_the_wire_format() {
        assert_eq!(Method::from_code(1), Method::Drift);
        assert_eq!(Method::from_code(2), Method::Traditional);
        assert_eq!(Method::from_code(3), Method::LockFree);
        assert_eq!(Method::from_code(0), Method::Drift);
        assert_eq!(Method::from_code(42), Method::Drift);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn options_deserialize_with_defaults() {
        let options: GeneratorOptions =
            serde_json::from_str(r#"{"worker_id": 7, "method": "LockFree"}"#).unwrap();
        assert_eq!(options.worker_id, 7);
        assert_eq!(options.method, Method::LockFree);
        assert_eq!(options.seq_bits, 12);

        let round_trip: GeneratorOptions =
            serde_json::from_str(&serde_json::to_string(&options).unwrap()).unwrap();
        assert_eq!(round_trip, options);
    }
}
