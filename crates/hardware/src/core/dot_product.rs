//! Single dot-product pipeline.
//!
//! One unit computes one output element: `D[i][j] = Σ A[i][k]·B[k][j] +
//! C[i][j]`. Its stages, upstream to downstream:
//!
//! - K parallel two-cycle multipliers, each with a one-entry parking buffer
//!   for its product;
//! - a log2(K)-deep tree of two-cycle FP9 adders, each fed through a
//!   pairwise input latch; level 0 pairs product `k` with product `k + K/2`
//!   and every later level pairs neighbours `(2i, 2i+1)`;
//! - a two-cycle FP22 accumulate stage combining the widened tree result
//!   with the bias element;
//! - a one-cycle output-converter latch.
//!
//! A tick processes the stages in reverse order so ready signals propagate
//! upstream within the cycle and no value crosses more than one register
//! boundary per tick. The unit keeps issuing the same operand pair into a
//! free multiplier; once the converter latch fills, backpressure freezes the
//! whole pipe and further ticks change nothing.

use crate::fp::add::{self, AddPrep};
use crate::fp::convert::fp9_to_fp22;
use crate::fp::rounding::RoundingMode;

use super::pipeline::{AccumAddPipe, MulPipe, TreeAddPipe};

/// One level of the pairwise add tree.
#[derive(Clone, Debug, Default)]
struct TreeLevel {
    stages: Vec<TreeAddPipe>,
    /// Pairwise input latches, one per adder; cleared when the adder accepts.
    pending: Vec<Option<AddPrep>>,
}

impl TreeLevel {
    fn with_width(width: usize) -> Self {
        Self {
            stages: vec![TreeAddPipe::default(); width],
            pending: vec![None; width],
        }
    }
}

/// One multiply–reduce–accumulate pipeline.
#[derive(Clone, Debug)]
pub struct DotProductUnit {
    k: usize,
    mul: Vec<MulPipe>,
    /// Parked multiplier outputs; level-0 latches read sibling pairs from
    /// here and clear both entries on acceptance.
    products: Vec<Option<u16>>,
    /// Tree levels, index 0 nearest the multipliers.
    levels: Vec<TreeLevel>,
    accum: AccumAddPipe,
    accum_pending: Option<AddPrep>,
    /// Converter latch; latches the final FP22 value and stays occupied so
    /// completed results are never overwritten.
    converted: Option<u32>,
}

impl DotProductUnit {
    /// Builds a unit for a power-of-two reduction width `k`.
    pub fn new(k: usize) -> Self {
        debug_assert!(k.is_power_of_two());
        let mut levels = Vec::new();
        let mut width = k / 2;
        while width >= 1 {
            levels.push(TreeLevel::with_width(width));
            width /= 2;
        }
        Self {
            k,
            mul: vec![MulPipe::default(); k],
            products: vec![None; k],
            levels,
            accum: AccumAddPipe::default(),
            accum_pending: None,
            converted: None,
        }
    }

    /// Clears every stage register and latch.
    pub fn reset(&mut self) {
        for m in &mut self.mul {
            m.reset();
        }
        for p in &mut self.products {
            *p = None;
        }
        for level in &mut self.levels {
            for s in &mut level.stages {
                s.reset();
            }
            for p in &mut level.pending {
                *p = None;
            }
        }
        self.accum.reset();
        self.accum_pending = None;
        self.converted = None;
    }

    /// Whether the converter latch holds the final value.
    pub fn is_done(&self) -> bool {
        self.converted.is_some()
    }

    /// Advances the unit by one clock cycle.
    ///
    /// `inputs` carries the unit's A-row and B-column slices while a job is
    /// loaded; `None` stops issuing new operand pairs so the pipe drains.
    /// Returns the FP22 result on the single tick it reaches the converter
    /// latch.
    pub fn tick(
        &mut self,
        inputs: Option<(&[u16], &[u16])>,
        c_fp22: u32,
        rm: RoundingMode,
    ) -> Option<u32> {
        // Converter latch: capture the accumulator output once.
        let mut published = None;
        if self.converted.is_none() {
            if let Some(v) = self.accum.output() {
                self.converted = Some(v);
                published = Some(v);
            }
        }
        let conv_ready = self.converted.is_none();

        // FP22 accumulate: latch the tree result (or, with K = 1, the lone
        // product) against the bias, then tick the stage.
        if self.accum_pending.is_none() {
            let tree_out = match self.levels.last() {
                Some(top) => top.stages[0].output(),
                None => self.products[0],
            };
            if let Some(t) = tree_out {
                self.accum_pending = Some(add::fp22_prepare(fp9_to_fp22(t), c_fp22, rm));
            }
        }
        if self.accum.tick(self.accum_pending, conv_ready) {
            self.accum_pending = None;
            if self.levels.is_empty() {
                self.products[0] = None;
            }
        }

        // Tree levels, top level first; each level's ready signals come from
        // the stage just processed.
        let mut parent_ready = vec![self.accum.in_ready(conv_ready)];
        for li in (0..self.levels.len()).rev() {
            let child_products: Vec<Option<u16>> = if li == 0 {
                self.products.clone()
            } else {
                self.levels[li - 1]
                    .stages
                    .iter()
                    .map(|s| s.output())
                    .collect()
            };

            let half = self.k >> 1;
            let level = &mut self.levels[li];
            let mut level_ready = Vec::with_capacity(level.stages.len());
            for si in 0..level.stages.len() {
                let (i0, i1) = if li == 0 {
                    (si, si + half)
                } else {
                    (2 * si, 2 * si + 1)
                };
                if level.pending[si].is_none() {
                    if let (Some(a), Some(b)) = (child_products[i0], child_products[i1]) {
                        level.pending[si] = Some(add::fp9_prepare(a, b, rm));
                    }
                }
                let ready = parent_ready[si / 2];
                level_ready.push(ready);
                if level.stages[si].tick(level.pending[si], ready) {
                    level.pending[si] = None;
                    if li == 0 {
                        self.products[i0] = None;
                        self.products[i1] = None;
                    }
                }
            }
            parent_ready = level
                .stages
                .iter()
                .zip(&level_ready)
                .map(|(s, &r)| s.in_ready(r))
                .collect();
        }

        // Multipliers: park finished products, re-issue the operand pair
        // whenever the parking buffer is free.
        for kk in 0..self.k {
            let out_ready = self.products[kk].is_none();
            let pair = match inputs {
                Some((a_row, b_col)) if out_ready => Some((a_row[kk], b_col[kk])),
                _ => None,
            };
            self.mul[kk].tick(pair, out_ready, rm);
            if self.products[kk].is_none() {
                self.products[kk] = self.mul[kk].output();
            }
        }

        published
    }
}
