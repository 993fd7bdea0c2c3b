//! Non-pipelined reference model.
//!
//! Composes the same arithmetic primitives as the pipelined engine (the
//! three-phase FP9 multiplier, the widened two-path tree adder, the FP9→FP22
//! widening, and the FP22 accumulate) without any stage registers. The
//! reduction uses the identical tree ordering (level 0 pairs product `k`
//! with product `k + K/2`, later levels pair neighbours), so the pipelined
//! and reference results are bit-identical for every defined input.

use crate::common::error::SimError;
use crate::config::ShapeConfig;
use crate::fp::add::{fp22_add, fp9_add};
use crate::fp::convert::fp9_to_fp22;
use crate::fp::mul::fp9_mul;
use crate::fp::rounding::RoundingMode;

/// Computes `D = A × B + C` combinationally.
///
/// `a` is `[m][k]` row-major FP9, `b` is `[k][n]` row-major FP9, `c` is
/// `[m][n]` row-major FP22; the result is `[m][n]` row-major FP22.
///
/// # Errors
///
/// Returns a [`SimError`] for a shape whose K is not a power of two or for
/// input slices that do not match the shape.
pub fn reference_matmul(
    a: &[u16],
    b: &[u16],
    c: &[u32],
    shape: &ShapeConfig,
    rm: RoundingMode,
) -> Result<Vec<u32>, SimError> {
    let (m, k, n) = (shape.m, shape.k, shape.n);
    if k == 0 {
        return Err(SimError::InvalidDimension("K", k));
    }
    if !k.is_power_of_two() {
        return Err(SimError::NonPowerOfTwoK(k));
    }
    if a.len() != m * k {
        return Err(SimError::ShapeMismatch("A", m * k, a.len()));
    }
    if b.len() != k * n {
        return Err(SimError::ShapeMismatch("B", k * n, b.len()));
    }
    if c.len() != m * n {
        return Err(SimError::ShapeMismatch("C", m * n, c.len()));
    }

    let mut d = vec![0u32; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut values: Vec<u16> = (0..k)
                .map(|kk| fp9_mul(a[i * k + kk], b[kk * n + j], rm))
                .collect();

            // Level 0 of the tree: the butterfly pairing (k, k + K/2).
            if k > 1 {
                let half = k / 2;
                values = (0..half)
                    .map(|s| fp9_add(values[s], values[s + half], rm))
                    .collect();
            }
            // Later levels pair neighbours until one sum remains.
            while values.len() > 1 {
                values = values
                    .chunks_exact(2)
                    .map(|pair| fp9_add(pair[0], pair[1], rm))
                    .collect();
            }

            d[i * n + j] = fp22_add(fp9_to_fp22(values[0]), c[i * n + j], rm);
        }
    }
    Ok(d)
}
