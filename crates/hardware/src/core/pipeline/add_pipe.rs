//! Add pipeline stages.
//!
//! Two-cycle stages around the two-path adder. Slot 1 carries the
//! path-classified intermediate ([`AddPrep`]: both path candidates plus the
//! selection flag); the rounded result is assembled as the value advances
//! into the output slot. The tree variant produces FP9 sums for the pairwise
//! reduction; the accumulator variant produces the FP22 running value.

use crate::fp::add::{self, AddPrep};

use super::stage::PipeStage;

/// Two-cycle FP9 tree-adder stage.
#[derive(Clone, Debug, Default)]
pub struct TreeAddPipe {
    stage: PipeStage<AddPrep, u16>,
}

impl TreeAddPipe {
    /// Whether a classified pair can be accepted this tick.
    pub fn in_ready(&self, out_ready: bool) -> bool {
        self.stage.in_ready(out_ready)
    }

    /// The rounded FP9 sum while the output slot is valid.
    pub fn output(&self) -> Option<u16> {
        self.stage.output().copied()
    }

    /// Clears the stage.
    pub fn reset(&mut self) {
        self.stage.reset();
    }

    /// Advances one cycle, optionally offering a classified operand pair.
    pub fn tick(&mut self, input: Option<AddPrep>, out_ready: bool) -> bool {
        self.stage.tick(input, out_ready, add::fp9_finalize)
    }
}

/// Two-cycle FP22 accumulate stage (tree result + C bias).
#[derive(Clone, Debug, Default)]
pub struct AccumAddPipe {
    stage: PipeStage<AddPrep, u32>,
}

impl AccumAddPipe {
    /// Whether a classified pair can be accepted this tick.
    pub fn in_ready(&self, out_ready: bool) -> bool {
        self.stage.in_ready(out_ready)
    }

    /// The rounded FP22 sum while the output slot is valid.
    pub fn output(&self) -> Option<u32> {
        self.stage.output().copied()
    }

    /// Clears the stage.
    pub fn reset(&mut self) {
        self.stage.reset();
    }

    /// Advances one cycle, optionally offering a classified operand pair.
    pub fn tick(&mut self, input: Option<AddPrep>, out_ready: bool) -> bool {
        self.stage.tick(input, out_ready, add::fp22_finalize)
    }
}
