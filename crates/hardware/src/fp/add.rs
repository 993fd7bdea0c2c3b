//! Two-path floating-point adder.
//!
//! The adder computes both candidate results in parallel during
//! classification ([`prepare`]) and selects between them during result
//! assembly ([`finalize`]), which is how the RTL splits the work across its
//! two pipeline registers:
//!
//! - **Far path**: effective addition, or subtraction with an exponent
//!   difference greater than one: align the smaller significand with a full
//!   sticky capture, add or subtract, and fold a carry back into the
//!   exponent.
//! - **Near path**: effective subtraction with exponents at most one apart,
//!   a one-bit alignment, an absolute difference, and an LZC-driven
//!   renormalization with the shift clamped at the subnormal boundary.
//!
//! Parameterized by `expw`, `precw` (input significand width, hidden bit
//! included), and `outw` (output significand width). The dot-product tree
//! feeds FP9 operands widened to FP13 (`expw=5, precw=8, outw=4`) and the
//! accumulator feeds FP22 operands widened by 14 bits
//! (`expw=8, precw=28, outw=14`), matching the RTL's zero-padding of each
//! operand register.

use super::rounding::{round, RoundingMode};
use super::unpack;

/// Path-classified intermediate state: both candidate results plus the
/// selection flag, as held in the adder's first pipeline register.
#[derive(Clone, Copy, Debug)]
pub struct AddPrep {
    /// Rounding mode for result assembly.
    pub rm: RoundingMode,
    /// True when the far path provides the result.
    pub sel_far: bool,
    /// Far-path candidate sign.
    pub far_sign: bool,
    /// Far-path candidate exponent (carry already folded).
    pub far_exp: u32,
    /// Far-path candidate significand in the `outw+3`-bit rounding frame.
    pub far_sig: u64,
    /// Near-path candidate sign.
    pub near_sign: bool,
    /// Near-path candidate exponent after renormalization.
    pub near_exp: u32,
    /// Near-path candidate significand in the `outw+3`-bit rounding frame.
    pub near_sig: u64,
    /// The near-path difference cancelled to exactly zero.
    pub near_sig_is_zero: bool,
    /// A special-case output (NaN or Inf) overrides both paths.
    pub special: bool,
    /// The special output is a quiet NaN.
    pub special_nan: bool,
    /// Sign of the Inf operand, used when the special output is an infinity.
    pub special_inf_sign: bool,
    /// The operation raises invalid-operation (sNaN operand or Inf − Inf).
    pub invalid: bool,
}

struct FarOut {
    sign: bool,
    exp: u32,
    sig: u64,
}

/// Far path: full alignment shift with sticky capture, then add or subtract.
fn far_path(
    a_sign: bool,
    a_exp: u32,
    a_sig: u64,
    b_sig: u64,
    expdiff: u32,
    effsub: bool,
    small_add: bool,
    precw: u32,
    outw: u32,
) -> FarOut {
    let (b_shifted, mut sticky) = if expdiff < precw + 3 {
        let dropped = b_sig & ((1u64 << expdiff) - 1);
        (b_sig >> expdiff, dropped != 0)
    } else {
        (0, b_sig != 0)
    };

    let mut exp = a_exp;
    let sig_result = if effsub {
        // Selected only when the magnitudes are at least two binades apart,
        // so the difference cannot go negative; the wrapping form keeps the
        // unselected computation well-defined.
        a_sig.wrapping_sub(b_shifted) & ((1u64 << (precw + 1)) - 1)
    } else {
        let mut sum = a_sig + b_shifted;
        if (sum >> precw) & 1 == 1 {
            sticky |= sum & 1 == 1;
            sum >>= 1;
            exp += 1;
        }
        sum
    };

    if small_add {
        exp = 0;
    }

    // Re-align the result into the outw+3-bit rounding frame: top bit,
    // mantissa, guard, round, sticky.
    let shift = precw as i32 - outw as i32 - 2;
    let (top, extra_sticky) = if shift > 0 {
        let dropped = sig_result & ((1u64 << shift) - 1);
        (sig_result >> shift, dropped != 0)
    } else {
        (sig_result << (-shift), false)
    };

    FarOut {
        sign: a_sign,
        exp,
        sig: ((top & ((1u64 << (outw + 2)) - 1)) << 1) | u64::from(sticky || extra_sticky),
    }
}

struct NearOut {
    sign: bool,
    exp: u32,
    sig: u64,
    sig_is_zero: bool,
    a_lt_b: bool,
}

/// Near path: one-bit alignment, absolute difference, LZC renormalization.
fn near_path(
    a_sign: bool,
    a_exp: u32,
    a_sig: u64,
    b_sign: bool,
    b_sig: u64,
    shift_b: bool,
    precw: u32,
    outw: u32,
) -> NearOut {
    let b_aligned = if shift_b { b_sig >> 1 } else { b_sig };

    let a_lt_b = a_sig < b_aligned;
    let (diff, sign) = if a_lt_b {
        (b_aligned - a_sig, b_sign)
    } else {
        (a_sig - b_aligned, a_sign)
    };

    let (exp, normalized) = if diff == 0 {
        (0, 0)
    } else {
        // Shift the top set bit up to the hidden position, but never past
        // the subnormal boundary.
        let msb = 63 - diff.leading_zeros();
        let norm_shift = (precw - 1) - msb;
        if a_exp > norm_shift {
            (a_exp - norm_shift, diff << (norm_shift + 1))
        } else {
            (0, diff << a_exp)
        }
    };

    let shift = precw as i32 - outw as i32 - 2;
    let sig = if shift > 0 {
        normalized >> shift
    } else {
        normalized << (-shift)
    };

    NearOut {
        sign,
        exp,
        sig: sig & ((1u64 << (outw + 3)) - 1),
        sig_is_zero: diff == 0,
        a_lt_b,
    }
}

/// Classification and parallel path computation.
pub fn prepare(
    a_bits: u64,
    b_bits: u64,
    expw: u32,
    precw: u32,
    outw: u32,
    rm: RoundingMode,
) -> AddPrep {
    let a = unpack(a_bits, expw, precw);
    let b = unpack(b_bits, expw, precw);

    let eff_sub = a.sign ^ b.sign;
    let small_add = a.exp_is_zero && b.exp_is_zero;

    let has_nan = a.is_nan || b.is_nan;
    let has_inf = a.is_inf || b.is_inf;
    let inf_minus_inf = a.is_inf && b.is_inf && eff_sub;

    let exp_diff_a_b = a.adj_exp as i32 - b.adj_exp as i32;
    let need_swap = exp_diff_a_b < 0;
    let expdiff = exp_diff_a_b.unsigned_abs();
    let sel_far = !eff_sub || expdiff > 1;

    let (far_a_sign, far_a_exp, far_a_sig, far_b_sig) = if need_swap {
        (b.sign, b.adj_exp, b.sig, a.sig)
    } else {
        (a.sign, a.adj_exp, a.sig, b.sig)
    };
    let far = far_path(
        far_a_sign, far_a_exp, far_a_sig, far_b_sig, expdiff, eff_sub, small_add, precw, outw,
    );

    // Both near-path orientations are computed, mirroring the two RTL
    // instances; the selection depends on which operand dominates.
    let exp_neq = a.adj_exp != b.adj_exp;
    let np0 = near_path(a.sign, a.adj_exp, a.sig, b.sign, b.sig, exp_neq, precw, outw);
    let np1 = near_path(b.sign, b.adj_exp, b.sig, a.sign, a.sig, exp_neq, precw, outw);
    let near = if need_swap || (!exp_neq && np0.a_lt_b) {
        np1
    } else {
        np0
    };

    AddPrep {
        rm,
        sel_far,
        far_sign: far.sign,
        far_exp: far.exp,
        far_sig: far.sig,
        near_sign: near.sign,
        near_exp: near.exp,
        near_sig: near.sig,
        near_sig_is_zero: near.sig_is_zero,
        special: has_nan || has_inf,
        special_nan: has_nan || inf_minus_inf,
        special_inf_sign: if a.is_inf { a.sign } else { b.sign },
        invalid: a.is_snan || b.is_snan || inf_minus_inf,
    }
}

/// Rounding and result assembly in the output format.
pub fn finalize(prep: &AddPrep, expw: u32, outw: u32) -> u64 {
    let mant_bits = outw - 1;
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
            return pack(false, inv, 1u64 << (mant_bits - 1));
        }
        return pack(prep.special_inf_sign, inv, 0);
    }

    // Shared rounding-frame split: drop the top bit, take the mantissa,
    // the round bit, and the sticky OR of the low two bits.
    let split = |sig: u64| -> (u64, bool, bool) {
        let frame = sig & ((1u64 << (outw + 2)) - 1);
        let data = (frame >> 3) & mant_mask;
        let round_bit = (frame >> 2) & 1 == 1;
        let sticky = frame & 0x3 != 0;
        (data, round_bit, sticky)
    };

    let (far_data, far_round, far_sticky) = split(prep.far_sig);
    let far_r = round(far_data, mant_bits, prep.far_sign, far_round, far_sticky, prep.rm);
    let far_exp_rounded = prep.far_exp + u32::from(far_r.carry);
    let far_overflow =
        prep.far_exp == inv || (far_r.carry && prep.far_exp == near_inv);

    let near_is_zero = prep.near_exp == 0 && prep.near_sig_is_zero;
    let (near_data, near_round, near_sticky) = split(prep.near_sig);
    let near_r = round(
        near_data,
        mant_bits,
        prep.near_sign,
        near_round,
        near_sticky,
        prep.rm,
    );
    let near_exp_rounded = prep.near_exp + u32::from(near_r.carry);
    // An exact zero is +0, except that RDN keeps the downward sign.
    let near_sign_out =
        (prep.near_sign && !near_is_zero) || (prep.rm == RoundingMode::Rdn && near_is_zero);
    let near_overflow = near_exp_rounded == inv;

    let overflow = if prep.sel_far {
        far_overflow
    } else {
        near_overflow
    };
    if overflow {
        let sign = if prep.sel_far {
            prep.far_sign
        } else {
            prep.near_sign
        };
        return if prep.rm.overflow_to_max_finite(sign) {
            pack(sign, near_inv, mant_mask)
        } else {
            pack(sign, inv, 0)
        };
    }

    if prep.sel_far {
        pack(prep.far_sign, far_exp_rounded, far_r.value)
    } else {
        pack(near_sign_out, near_exp_rounded, near_r.value)
    }
}

/// Complete add: classification and assembly combinationally.
pub fn add(a_bits: u64, b_bits: u64, expw: u32, precw: u32, outw: u32, rm: RoundingMode) -> u64 {
    finalize(&prepare(a_bits, b_bits, expw, precw, outw, rm), expw, outw)
}

/// Classifies an FP9 pair for the add tree, widening both operands to FP13
/// by padding four zero mantissa bits.
pub fn fp9_prepare(a: u16, b: u16, rm: RoundingMode) -> AddPrep {
    prepare(u64::from(a) << 4, u64::from(b) << 4, 5, 8, 4, rm)
}

/// Assembles an FP9 result from a classified tree-adder pair.
pub fn fp9_finalize(prep: &AddPrep) -> u16 {
    finalize(prep, 5, 4) as u16
}

/// FP9 + FP9 → FP9 through the widened tree adder.
pub fn fp9_add(a: u16, b: u16, rm: RoundingMode) -> u16 {
    fp9_finalize(&fp9_prepare(a, b, rm))
}

/// Classifies an FP22 pair for the accumulate stage, padding fourteen zero
/// mantissa bits.
pub fn fp22_prepare(a: u32, b: u32, rm: RoundingMode) -> AddPrep {
    prepare(u64::from(a) << 14, u64::from(b) << 14, 8, 28, 14, rm)
}

/// Assembles an FP22 result from a classified accumulate pair.
pub fn fp22_finalize(prep: &AddPrep) -> u32 {
    finalize(prep, 8, 14) as u32
}

/// FP22 + FP22 → FP22 through the widened accumulator adder.
pub fn fp22_add(a: u32, b: u32, rm: RoundingMode) -> u32 {
    fp22_finalize(&fp22_prepare(a, b, rm))
}
