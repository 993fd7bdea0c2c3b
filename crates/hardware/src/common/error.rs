//! Simulator error definitions.
//!
//! This module defines the error handling surface of the library. It provides:
//! 1. **Configuration Errors:** Invalid shapes and unsupported format tags,
//!    raised before any simulator state is mutated.
//! 2. **Control Errors:** Job sequencing faults and cycle-budget exhaustion.
//! 3. **Error Handling:** Integration with the standard Rust error traits.
//!
//! Arithmetic operations never fail; floating-point specials (NaN, Inf,
//! subnormal, overflow) are ordinary bit patterns, not errors.

use std::fmt;

use crate::fp::format::Format;

/// Errors raised by the tensor-core control surface and the conversion
/// dispatchers.
///
/// Configuration errors are raised by [`TensorCore::new`] and
/// [`TensorCore::load`] before any state is mutated. The only error that can
/// occur mid-simulation is [`SimError::CycleBudgetExceeded`], which indicates
/// a stuck pipeline; the caller must treat the engine state as indeterminate
/// and reset before reuse.
///
/// [`TensorCore::new`]: crate::core::TensorCore::new
/// [`TensorCore::load`]: crate::core::TensorCore::load
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SimError {
    /// A tile dimension is zero.
    ///
    /// The associated values are the dimension name and its rejected value.
    InvalidDimension(&'static str, usize),

    /// The reduction dimension K is not a power of two.
    ///
    /// The add tree pairs operands level by level, so K must be `2^n`.
    NonPowerOfTwoK(usize),

    /// The requested input precision is not one the conversion front end
    /// accepts (FP4 E2M1, FP8 E4M3, FP8 E5M2, or FP16).
    UnsupportedInputFormat(Format),

    /// The requested output precision is not one the back-end converter
    /// produces (FP8 E4M3, FP8 E5M2, FP16, or FP32).
    UnsupportedOutputFormat(Format),

    /// No conversion is defined between the given source and destination
    /// formats.
    UnsupportedConversion(Format, Format),

    /// An input matrix slice does not match the configured tile shape.
    ///
    /// The associated values are the matrix name, the expected element count,
    /// and the provided element count.
    ShapeMismatch(&'static str, usize, usize),

    /// `run_to_completion` was called without a loaded job.
    JobNotLoaded,

    /// The cycle budget ran out before every output cell completed.
    ///
    /// Completion flags may be partially set; the engine state is
    /// indeterminate until the next `reset`.
    CycleBudgetExceeded {
        /// The budget that was exhausted.
        budget: u64,
        /// Number of output cells that did complete.
        completed: usize,
        /// Total number of output cells in the tile.
        total: usize,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidDimension(name, value) => {
                write!(f, "invalid dimension {}={}", name, value)
            }
            SimError::NonPowerOfTwoK(k) => {
                write!(f, "reduction dimension K={} is not a power of two", k)
            }
            SimError::UnsupportedInputFormat(fmt_tag) => {
                write!(f, "unsupported input format {}", fmt_tag)
            }
            SimError::UnsupportedOutputFormat(fmt_tag) => {
                write!(f, "unsupported output format {}", fmt_tag)
            }
            SimError::UnsupportedConversion(src, dst) => {
                write!(f, "no conversion from {} to {}", src, dst)
            }
            SimError::ShapeMismatch(name, expected, got) => {
                write!(
                    f,
                    "matrix {} has {} elements, expected {}",
                    name, got, expected
                )
            }
            SimError::JobNotLoaded => {
                write!(f, "no job loaded; call load() after reset()")
            }
            SimError::CycleBudgetExceeded {
                budget,
                completed,
                total,
            } => {
                write!(
                    f,
                    "cycle budget of {} exhausted with {}/{} outputs complete",
                    budget, completed, total
                )
            }
        }
    }
}

impl std::error::Error for SimError {}
