//! Three-phase multiplier tests.
//!
//! The FP9 instantiation (`expw=5, precw=4`) is the one the datapath uses;
//! these tests exercise exact products, rounding, subnormals, specials, and
//! the overflow saturation policy.

use otc_core::fp::mul::{fp9_mul, multiply};
use otc_core::fp::rounding::RoundingMode;

use crate::common::{fp9, fp9_is_nan, fp9_to_f64, FP9_ONE};

const RNE: RoundingMode = RoundingMode::Rne;

fn is_finite_fp9(bits: u16) -> bool {
    (bits >> 3) & 0x1F != 0x1F
}

// ══════════════════════════════════════════════════════════
// 1. Exact products
// ══════════════════════════════════════════════════════════

#[test]
fn one_times_one_is_one() {
    assert_eq!(fp9_mul(FP9_ONE, FP9_ONE, RNE), FP9_ONE);
}

#[test]
fn multiplying_by_one_is_the_identity_for_every_finite_value() {
    for bits in 0u16..0x200 {
        if !is_finite_fp9(bits) {
            continue;
        }
        assert_eq!(fp9_mul(bits, FP9_ONE, RNE), bits, "x = {:#05x}", bits);
        assert_eq!(fp9_mul(FP9_ONE, bits, RNE), bits, "x = {:#05x}", bits);
    }
}

#[test]
fn simple_exact_products() {
    let two = fp9(0, 16, 0);
    let four = fp9(0, 17, 0);
    let half = fp9(0, 14, 0);
    assert_eq!(fp9_mul(two, two, RNE), four);
    assert_eq!(fp9_mul(two, half, RNE), FP9_ONE);
    // 1.5 × 1.5 = 2.25
    assert_eq!(fp9_mul(fp9(0, 15, 4), fp9(0, 15, 4), RNE), fp9(0, 16, 1));
    // Signs combine.
    assert_eq!(fp9_mul(fp9(1, 15, 0), two, RNE), fp9(1, 16, 0));
    assert_eq!(fp9_mul(fp9(1, 15, 0), fp9(1, 16, 0), RNE), two);
}

#[test]
fn subnormal_products() {
    // 2^-14 × 0.5 = 2^-15, a subnormal result.
    let min_normal = fp9(0, 1, 0);
    let half = fp9(0, 14, 0);
    assert_eq!(fp9_mul(min_normal, half, RNE), fp9(0, 0, 4));
    // Subnormal operand times a power of two renormalizes exactly.
    let sub = fp9(0, 0, 1); // 2^-17
    assert_eq!(fp9_to_f64(fp9_mul(sub, fp9(0, 17, 0), RNE)), 2f64.powi(-15));
}

// ══════════════════════════════════════════════════════════
// 2. Rounding
// ══════════════════════════════════════════════════════════

#[test]
fn inexact_products_round_per_mode() {
    // 1.125 × 1.125 = 1.265625, between 1.25 (mant 010) and 1.375 (011).
    let a = fp9(0, 15, 1);
    assert_eq!(fp9_mul(a, a, RNE), fp9(0, 15, 2), "nearest is 1.25");
    assert_eq!(fp9_mul(a, a, RoundingMode::Rtz), fp9(0, 15, 2));
    assert_eq!(fp9_mul(a, a, RoundingMode::Rup), fp9(0, 15, 3));
    // Negative operand flips the directed modes.
    let na = fp9(1, 15, 1);
    assert_eq!(fp9_mul(na, a, RoundingMode::Rdn), fp9(1, 15, 3));
    assert_eq!(fp9_mul(na, a, RoundingMode::Rup), fp9(1, 15, 2));
}

// ══════════════════════════════════════════════════════════
// 3. Specials
// ══════════════════════════════════════════════════════════

#[test]
fn zero_times_anything_finite_is_signed_zero() {
    let zero = fp9(0, 0, 0);
    let neg = fp9(1, 16, 3);
    assert_eq!(fp9_mul(zero, neg, RNE), fp9(1, 0, 0));
    assert_eq!(fp9_mul(zero, fp9(0, 20, 5), RNE), 0);
}

#[test]
fn infinity_propagates_with_sign() {
    let inf = fp9(0, 0x1F, 0);
    let neg_two = fp9(1, 16, 0);
    assert_eq!(fp9_mul(inf, neg_two, RNE), fp9(1, 0x1F, 0));
    assert_eq!(fp9_mul(inf, inf, RNE), inf);
}

#[test]
fn zero_times_infinity_is_a_quiet_nan() {
    let out = fp9_mul(fp9(0, 0, 0), fp9(0, 0x1F, 0), RNE);
    assert!(fp9_is_nan(out));
    assert_ne!(out & 0x4, 0, "quiet bit set");
}

#[test]
fn nan_operands_produce_quiet_nans() {
    let qnan = fp9(0, 0x1F, 5);
    let snan = fp9(0, 0x1F, 1);
    for other in [FP9_ONE, fp9(1, 0, 0), fp9(0, 0x1F, 0)] {
        assert!(fp9_is_nan(fp9_mul(qnan, other, RNE)));
        let from_snan = fp9_mul(snan, other, RNE);
        assert!(fp9_is_nan(from_snan));
        assert_ne!(from_snan & 0x4, 0, "sNaN quiets");
    }
}

// ══════════════════════════════════════════════════════════
// 4. Overflow
// ══════════════════════════════════════════════════════════

#[test]
fn overflow_saturates_per_mode() {
    let max = fp9(0, 30, 7);
    assert_eq!(fp9_mul(max, max, RNE), fp9(0, 0x1F, 0), "RNE overflows to Inf");
    assert_eq!(fp9_mul(max, max, RoundingMode::Rtz), max, "RTZ stays finite");
    assert_eq!(fp9_mul(max, max, RoundingMode::Rdn), max);
    let neg_max = fp9(1, 30, 7);
    assert_eq!(
        fp9_mul(max, neg_max, RoundingMode::Rup),
        fp9(1, 30, 7),
        "RUP keeps a negative overflow finite"
    );
    assert_eq!(fp9_mul(max, neg_max, RNE), fp9(1, 0x1F, 0));
}

// ══════════════════════════════════════════════════════════
// 5. Closure
// ══════════════════════════════════════════════════════════

#[test]
fn every_product_is_commutative_and_nine_bits() {
    for a in (0u16..0x200).step_by(7) {
        for b in 0u16..0x200 {
            let ab = fp9_mul(a, b, RNE);
            assert_eq!(ab & !0x1FF, 0, "width closure for {:#x}×{:#x}", a, b);
            assert_eq!(ab, fp9_mul(b, a, RNE), "{:#x}×{:#x}", a, b);
        }
    }
}

#[test]
fn generic_width_wrapper_matches_the_fp9_path() {
    assert_eq!(
        multiply(u64::from(FP9_ONE), u64::from(FP9_ONE), 5, 4, RNE),
        u64::from(FP9_ONE)
    );
}
