//! Multiply pipeline stage.
//!
//! A two-cycle stage around the three-phase FP9 multiplier: the cycle an
//! operand pair is accepted, phase 1 (unpack, classify, exponent datapath)
//! runs and its result is registered in slot 1; on the next tick the
//! significand product and the normalize/round phase run combinationally as
//! the value advances into the output slot.

use crate::fp::mul::{self, MulPrep};
use crate::fp::rounding::RoundingMode;

use super::stage::PipeStage;

/// FP9 exponent width.
const EXPW: u32 = 5;
/// FP9 significand width (hidden bit included).
const PRECW: u32 = 4;

/// Two-cycle FP9 multiply stage.
#[derive(Clone, Debug, Default)]
pub struct MulPipe {
    stage: PipeStage<MulPrep, u16>,
}

impl MulPipe {
    /// An empty multiply stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a new operand pair can be accepted this tick.
    pub fn in_ready(&self, out_ready: bool) -> bool {
        self.stage.in_ready(out_ready)
    }

    /// The rounded FP9 product while the output slot is valid.
    pub fn output(&self) -> Option<u16> {
        self.stage.output().copied()
    }

    /// Clears the stage.
    pub fn reset(&mut self) {
        self.stage.reset();
    }

    /// Advances one cycle, optionally offering an `(a, b)` FP9 operand pair.
    ///
    /// Returns whether the pair was accepted.
    pub fn tick(&mut self, input: Option<(u16, u16)>, out_ready: bool, rm: RoundingMode) -> bool {
        let prep = input
            .map(|(a, b)| mul::prepare(u64::from(a), u64::from(b), EXPW, PRECW, rm));
        self.stage.tick(prep, out_ready, |p| {
            let prod = mul::significand_product(p.a_bits, p.b_bits, EXPW, PRECW);
            mul::finalize(p, prod, EXPW, PRECW) as u16
        })
    }
}
