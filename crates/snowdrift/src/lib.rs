//! Snowflake-style 64-bit ID generation for distributed producers.
//!
//! IDs pack `[timestamp][datacenter][worker][sequence]` into a `u64` with
//! configurable field widths, and advance their per-millisecond sequence
//! under one of three concurrency strategies: lock-based with virtual-tick
//! drift ([`DriftSnowflakeGenerator`]), lock-based with classic
//! wait-on-exhaustion ([`LockSnowflakeGenerator`]), or lock-free CAS
//! ([`AtomicSnowflakeGenerator`]). [`IdGenerator`] selects a strategy from
//! validated [`GeneratorOptions`]; all strategies share the same
//! [`BitLayout`], so the wire format of produced IDs depends only on the
//! configuration, never on the method.

mod error;
mod factory;
mod generator;
mod layout;
mod mono_clock;
mod options;
mod time;

pub use crate::error::*;
pub use crate::factory::*;
pub use crate::generator::*;
pub use crate::layout::*;
pub use crate::mono_clock::*;
pub use crate::options::*;
pub use crate::time::*;
