//! Configuration system for the tensor-core simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! model. It provides:
//! 1. **Defaults:** Baseline hardware constants (tile shape, stage latencies,
//!    cycle budget).
//! 2. **Structures:** Hierarchical config for the tile shape, the per-job
//!    precisions, and simulation control.
//!
//! Configuration is supplied as JSON through the CLI's `--config` flag or use
//! `Config::default()` for the canonical 8×8×8 core.

use serde::Deserialize;

use crate::common::error::SimError;
use crate::fp::format::Format;
use crate::fp::rounding::RoundingMode;

/// Default configuration constants for the simulator.
///
/// These values define the canonical hardware configuration when not
/// explicitly overridden by a configuration file.
pub mod defaults {
    /// Rows of the output tile (and of A).
    pub const SHAPE_M: usize = 8;

    /// Reduction dimension shared by A and B.
    ///
    /// Must be a power of two; it fixes the number of parallel multipliers
    /// and the depth of the pairwise add tree in every dot-product unit.
    pub const SHAPE_K: usize = 8;

    /// Columns of the output tile (and of B).
    pub const SHAPE_N: usize = 8;

    /// Latency of one multiply pipeline stage in cycles.
    ///
    /// The multiplier holds unpack/classify results for one cycle and
    /// produces the rounded product on the next.
    pub const MUL_LATENCY: u64 = 2;

    /// Latency of one add pipeline stage in cycles.
    ///
    /// Applies to every level of the add tree and to the FP22 accumulate
    /// stage.
    pub const ADD_LATENCY: u64 = 2;

    /// Latency of the output-format converter in cycles.
    pub const CONV_LATENCY: u64 = 1;

    /// Default cycle budget for `run_to_completion`.
    ///
    /// Generous compared to the pipeline depth; exceeding it means the
    /// pipeline is stuck, which is reported as an error.
    pub const MAX_CYCLES: u64 = 100;
}

/// Dimensions of the `D[M×N] = A[M×K] × B[K×N] + C[M×N]` tile.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct ShapeConfig {
    /// Rows of A and D.
    pub m: usize,
    /// Reduction dimension (columns of A, rows of B). Power of two.
    pub k: usize,
    /// Columns of B and D.
    pub n: usize,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            m: defaults::SHAPE_M,
            k: defaults::SHAPE_K,
            n: defaults::SHAPE_N,
        }
    }
}

impl ShapeConfig {
    /// Number of levels in the pairwise add tree (`log2 K`).
    pub fn tree_depth(&self) -> u32 {
        self.k.trailing_zeros()
    }

    /// Number of dot-product units in the array.
    pub fn units(&self) -> usize {
        self.m * self.n
    }
}

/// Per-job precision and rounding configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    /// Element format of the A and B operand matrices.
    pub input_format: Format,
    /// Element format of the C bias and D result matrices.
    pub output_format: Format,
    /// Rounding mode applied throughout the datapath.
    pub rounding: RoundingMode,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            input_format: Format::Fp8E4m3,
            output_format: Format::Fp8E4m3,
            rounding: RoundingMode::Rne,
        }
    }
}

/// Simulation control configuration.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Cycle budget handed to `run_to_completion`.
    pub max_cycles: u64,
    /// Print per-cycle progress from the CLI harness.
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_cycles: defaults::MAX_CYCLES,
            trace: false,
        }
    }
}

/// Root configuration for the simulator.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tile dimensions.
    pub shape: ShapeConfig,
    /// Job precisions and rounding mode.
    pub job: JobConfig,
    /// Simulation control.
    pub sim: SimConfig,
}

impl Config {
    /// Total pipeline depth in cycles for this shape.
    ///
    /// Multiply stage, one add stage per tree level, the FP22 accumulate
    /// stage, and the output converter.
    pub fn pipeline_depth(&self) -> u64 {
        defaults::MUL_LATENCY
            + u64::from(self.shape.tree_depth()) * defaults::ADD_LATENCY
            + defaults::ADD_LATENCY
            + defaults::CONV_LATENCY
    }

    /// Checks the configuration before any engine state is built.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] for a zero dimension, a non-power-of-two K, or
    /// a format tag the datapath does not accept.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.shape.m == 0 {
            return Err(SimError::InvalidDimension("M", self.shape.m));
        }
        if self.shape.n == 0 {
            return Err(SimError::InvalidDimension("N", self.shape.n));
        }
        if self.shape.k == 0 {
            return Err(SimError::InvalidDimension("K", self.shape.k));
        }
        if !self.shape.k.is_power_of_two() {
            return Err(SimError::NonPowerOfTwoK(self.shape.k));
        }
        if !self.job.input_format.is_input_format() {
            return Err(SimError::UnsupportedInputFormat(self.job.input_format));
        }
        if !self.job.output_format.is_output_format() {
            return Err(SimError::UnsupportedOutputFormat(self.job.output_format));
        }
        Ok(())
    }
}
