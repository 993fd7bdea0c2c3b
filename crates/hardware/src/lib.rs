//! OpenTensorCore simulator library.
//!
//! This crate implements a cycle-accurate functional model of the
//! OpenTensorCore matrix-multiply accelerator with the following:
//! 1. **Arithmetic:** Bit-exact narrow floating-point formats (FP4, FP8, FP9,
//!    FP13, FP16, FP22, FP32), rounding, conversion, multiply, and add.
//! 2. **Pipeline:** Elastic two-slot stage registers with valid/ready
//!    handshaking, and typed multiply/add stage wrappers.
//! 3. **Engine:** Dot-product units (K multipliers, a pairwise add tree, an
//!    FP22 accumulate stage, an output converter) arranged in an M×N array.
//! 4. **Reference:** A non-pipelined model built from the same arithmetic
//!    primitives, bit-identical to the pipelined path.
//! 5. **Simulation:** Configuration, error types, and statistics collection.
//!
//! The model computes `D = A × B + C` over an `M × K × N` tile. Inputs are
//! converted to FP9 (E5M3), products are reduced through a log2(K)-deep add
//! tree, widened to FP22 (E8M13), combined with the bias matrix, and
//! converted to the requested output format.

/// Common types (error definitions).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// Pipelined engine (stage registers, dot-product unit, tensor-core array).
pub mod core;
/// Bit-exact floating-point arithmetic (formats, rounding, convert, mul, add).
pub mod fp;
/// Non-pipelined reference model used to validate the pipelined path.
pub mod reference;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Library error type returned by every fallible operation.
pub use crate::common::error::SimError;
/// Main engine type; holds the M×N dot-product array and result matrices.
pub use crate::core::TensorCore;
