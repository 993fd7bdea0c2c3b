//! Pipelined tensor-core engine.
//!
//! This module implements the cycle-accurate datapath:
//! 1. **Pipeline registers:** Two-slot elastic buffers with valid/ready
//!    handshaking, plus typed multiply and add stage wrappers.
//! 2. **Dot-product unit:** K parallel multipliers feeding a pairwise add
//!    tree, an FP22 accumulate stage, and an output-converter latch.
//! 3. **Tensor core:** The M×N array of dot-product units with the job
//!    control surface (reset, load, tick, run-to-completion, results).

/// Single dot-product pipeline (one output element).
pub mod dot_product;
/// Elastic stage registers and the multiply/add stage wrappers.
pub mod pipeline;
/// The M×N dot-product array and its control surface.
pub mod tensor_core;

pub use dot_product::DotProductUnit;
pub use tensor_core::TensorCore;
