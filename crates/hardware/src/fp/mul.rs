//! Three-phase floating-point multiplier.
//!
//! The multiplier is split the way the RTL splits it, so the pipelined engine
//! can register intermediate state between cycles:
//! 1. [`prepare`]: unpack and classify the operands, compute the product
//!    exponent and the normalization shift, detect special cases and early
//!    exponent overflow.
//! 2. [`significand_product`]: the raw significand product (combinational).
//! 3. [`finalize`]: normalize the product, round, and assemble the packed
//!    result, with special-case outputs overriding the computed one.
//!
//! Parameterized by `expw` (exponent width) and `precw` (significand width,
//! hidden bit included); the FP9 datapath instantiates `expw=5, precw=4`.

use super::rounding::{round, RoundingMode};
use super::{leading_zeros, unpack};

/// Phase-1 output: everything the normalize/round phase needs except the raw
/// significand product.
///
/// The operand bit patterns ride along so a pipeline register holding this
/// struct can feed phase 2 on a later cycle without re-reading the input bus.
#[derive(Clone, Copy, Debug)]
pub struct MulPrep {
    /// Operand A bit pattern.
    pub a_bits: u64,
    /// Operand B bit pattern.
    pub b_bits: u64,
    /// Sign of the product.
    pub sign: bool,
    /// Left-shift applied to the significand product during normalization.
    pub shift: u32,
    /// Exponent after the normalization shift is accounted for.
    pub exp_shifted: i32,
    /// The shift was limited by the exponent range, so the result may land in
    /// the subnormal range.
    pub may_be_subnormal: bool,
    /// The exponent sum already exceeds the largest normal exponent.
    pub early_overflow: bool,
    /// A special-case output (NaN, Inf, or zero) overrides the datapath.
    pub special: bool,
    /// The special output is a quiet NaN.
    pub special_nan: bool,
    /// The special output is an infinity.
    pub special_inf: bool,
    /// At least one operand is a zero.
    pub special_has_zero: bool,
    /// The operation raises invalid-operation (sNaN operand or 0 × Inf).
    pub invalid: bool,
    /// Rounding mode for phase 3.
    pub rm: RoundingMode,
}

/// Phase 1: unpack, classify, and compute the exponent datapath.
pub fn prepare(a_bits: u64, b_bits: u64, expw: u32, precw: u32, rm: RoundingMode) -> MulPrep {
    let padding = precw as i32 + 2;
    let bias = (1i32 << (expw - 1)) - 1;
    let max_norm_exp = (1i32 << expw) - 2;

    let a = unpack(a_bits, expw, precw);
    let b = unpack(b_bits, expw, precw);

    let exp_sum = a.adj_exp as i32 + b.adj_exp as i32;
    let prod_exp = exp_sum - (bias - padding - 1);
    let shift_lim_sub = exp_sum - (bias - padding);
    let underflow = shift_lim_sub < 0;
    let shift_lim = shift_lim_sub.max(0);

    // One operand at most is subnormal in a product that survives
    // classification; its leading zeros bound the normalization shift.
    let subnormal_sig = if a.exp_is_zero { a.sig } else { b.sig };
    let lzc = leading_zeros(subnormal_sig, 2 * precw + 2) as i32;

    let exceeds_lim = shift_lim <= lzc;
    let shift = if underflow {
        0
    } else if exceeds_lim {
        shift_lim
    } else {
        lzc
    };

    let has_zero = a.is_zero || b.is_zero;
    let has_nan = a.is_nan || b.is_nan;
    let has_inf = a.is_inf || b.is_inf;
    let zero_mul_inf = has_zero && has_inf;

    MulPrep {
        a_bits,
        b_bits,
        sign: a.sign ^ b.sign,
        shift: shift as u32,
        exp_shifted: prod_exp - shift,
        may_be_subnormal: exceeds_lim || underflow,
        early_overflow: exp_sum > max_norm_exp + bias,
        special: has_zero || has_nan || has_inf,
        special_nan: has_nan || zero_mul_inf,
        special_inf: has_inf,
        special_has_zero: has_zero,
        invalid: a.is_snan || b.is_snan || zero_mul_inf,
        rm,
    }
}

/// Phase 2: the raw `precw × precw → 2·precw`-bit significand product, with
/// hidden bits recovered from the exponent fields.
pub fn significand_product(a_bits: u64, b_bits: u64, expw: u32, precw: u32) -> u64 {
    let a = unpack(a_bits, expw, precw);
    let b = unpack(b_bits, expw, precw);
    a.sig * b.sig
}

/// Phase 3: normalize, round, and assemble the packed result.
pub fn finalize(prep: &MulPrep, prod: u64, expw: u32, precw: u32) -> u64 {
    let mant_bits = precw - 1;
    let exp_mask = (1u64 << expw) - 1;
    let mant_mask = (1u64 << mant_bits) - 1;
    let inv = exp_mask as u32;
    let near_inv = inv - 1;

    let pack = |sign: bool, exp: u32, mant: u64| -> u64 {
        (u64::from(sign) << (expw + mant_bits))
            | ((u64::from(exp) & exp_mask) << mant_bits)
            | (mant & mant_mask)
    };

    if prep.special {
        if prep.special_nan {
            // Quiet NaN: all-ones exponent, quiet bit set.
            return pack(prep.sign, inv, 1u64 << (mant_bits - 1));
        }
        if prep.special_inf {
            return pack(prep.sign, inv, 0);
        }
        return pack(prep.sign, 0, 0);
    }

    // The product sits in the low 2·precw bits of a 3·precw+2-bit field and
    // is shifted up by the amount phase 1 chose.
    let total = 3 * precw + 2;
    let shifted_raw = (prod << prep.shift) & ((1u64 << total) - 1);

    let top_set = (shifted_raw >> (total - 1)) & 1 == 1;
    let exp_is_subnormal = prep.may_be_subnormal && !top_set;
    let no_extra_shift = top_set || exp_is_subnormal;

    let exp_pre_round = if exp_is_subnormal {
        0
    } else if no_extra_shift {
        prep.exp_shifted
    } else {
        prep.exp_shifted - 1
    };

    let sig_shifted = if no_extra_shift {
        shifted_raw
    } else {
        (shifted_raw & ((1u64 << (total - 1)) - 1)) << 1
    };

    // Field layout after normalization: hidden bit, mantissa, guard, round,
    // then 2·precw sticky bits.
    let mant = (sig_shifted >> (2 * precw + 2)) & mant_mask;
    let guard = (sig_shifted >> (2 * precw + 1)) & 1 == 1;
    let round_bit = (sig_shifted >> (2 * precw)) & 1 == 1;
    let sticky = sig_shifted & ((1u64 << (2 * precw)) - 1) != 0;

    let r = round(mant, mant_bits, prep.sign, guard, round_bit || sticky, prep.rm);

    let raw_exp = (exp_pre_round as u32) & inv;
    let exp_at_limit = if r.carry {
        raw_exp == near_inv
    } else {
        raw_exp == inv
    };
    let overflow = exp_at_limit || prep.early_overflow;

    if overflow {
        return if prep.rm.overflow_to_max_finite(prep.sign) {
            pack(prep.sign, near_inv, mant_mask)
        } else {
            pack(prep.sign, inv, 0)
        };
    }

    pack(prep.sign, raw_exp + u32::from(r.carry), r.value)
}

/// Complete multiply: all three phases combinationally.
pub fn multiply(a_bits: u64, b_bits: u64, expw: u32, precw: u32, rm: RoundingMode) -> u64 {
    let prep = prepare(a_bits, b_bits, expw, precw, rm);
    let prod = significand_product(a_bits, b_bits, expw, precw);
    finalize(&prep, prod, expw, precw)
}

/// FP9 × FP9 → FP9 convenience wrapper for the dot-product datapath.
pub fn fp9_mul(a: u16, b: u16, rm: RoundingMode) -> u16 {
    multiply(u64::from(a), u64::from(b), 5, 4, rm) as u16
}
