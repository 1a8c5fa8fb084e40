use std::sync::OnceLock;

use crate::{Error, GeneratorOptions, IdGenerator, Result};

static DEFAULT: OnceLock<IdGenerator> = OnceLock::new();

/// Initializes the process-wide default generator.
///
/// Call sites that cannot thread a handle through (legacy code, macros,
/// FFI shims) may use [`next_id`] afterwards; everything else should hold
/// its own [`IdGenerator`]. Initialization happens at most once per process:
/// there is no silent overwrite and no implicit fallback configuration.
///
/// # Errors
///
/// Returns a configuration error if `options` is invalid, or
/// [`Error::AlreadyInitialized`] if a default generator already exists
/// (including the case where a racing initialization won).
pub fn init_default(options: &GeneratorOptions) -> Result<()> {
    let generator = IdGenerator::new(options)?;
    DEFAULT
        .set(generator)
        .map_err(|_| Error::AlreadyInitialized)
}

/// Returns the process-wide default generator.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] if [`init_default`] has not completed.
pub fn default_generator() -> Result<&'static IdGenerator> {
    DEFAULT.get().ok_or(Error::NotInitialized)
}

/// Generates an ID from the process-wide default generator.
///
/// # Errors
///
/// Returns [`Error::NotInitialized`] before [`init_default`], otherwise
/// whatever [`IdGenerator::next_id`] returns.
pub fn next_id() -> Result<u64> {
    default_generator()?.next_id()
}
