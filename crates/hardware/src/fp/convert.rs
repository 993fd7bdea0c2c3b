//! Conversions between the packed floating-point formats.
//!
//! The datapath converts in three places: the input front end widens A and B
//! elements to FP9 and the C bias to FP22, the add tree widens FP9 operands
//! to FP13 and narrows sums back, and the output back end narrows the FP22
//! accumulator value to the requested result format.
//!
//! Widening conversions are lossless: subnormals renormalize exactly where
//! the target exponent range permits, and Inf/NaN encodings carry over.
//! Narrowing conversions align to the target mantissa width, collect a full
//! sticky over every dropped bit, and round through [`round`]; overflow
//! follows the rounding-mode saturation policy, except FP8 E4M3, which has no
//! infinity and always saturates to (e=14, m=7). FP22 → FP32 is an exact
//! bit-field remap.
//!
//! FP8 E5M2 values reach the accumulator via FP9, never through a direct
//! E5M2 → FP22 conversion.

use crate::common::error::SimError;

use super::format::Format;
use super::leading_zeros;
use super::rounding::{round, RoundingMode};

/// Re-rounds a finite value into a narrower mantissa.
///
/// Returns the target exponent field (zero for a subnormal result) and the
/// rounded mantissa. The caller handles specials beforehand and applies the
/// overflow policy when the returned exponent reaches the all-ones encoding.
fn round_finite(
    sign: bool,
    src_exp: u32,
    src_mant: u64,
    src_mant_bits: u32,
    src_bias: i32,
    tgt_mant_bits: u32,
    tgt_bias: i32,
    rm: RoundingMode,
) -> (i32, u64) {
    debug_assert!(src_mant_bits > tgt_mant_bits);
    let hidden = u64::from(src_exp != 0);
    let unbiased = if src_exp == 0 {
        1 - src_bias
    } else {
        src_exp as i32 - src_bias
    };
    let sig = (hidden << src_mant_bits) | src_mant;

    let mut exp = unbiased + tgt_bias;
    let extra = if exp <= 0 { (1 - exp) as u32 } else { 0 };
    if exp <= 0 {
        exp = 0;
    }
    let drop = ((src_mant_bits - tgt_mant_bits) + extra).min(63);

    let full = sig >> drop;
    let kept = full & ((1u64 << tgt_mant_bits) - 1);
    let round_bit = (sig >> (drop - 1)) & 1 == 1;
    let sticky = drop >= 2 && sig & ((1u64 << (drop - 1)) - 1) != 0;
    let hidden_out = (full >> tgt_mant_bits) & 1 == 1;

    let r = round(kept, tgt_mant_bits, sign, round_bit, sticky, rm);
    if r.carry {
        (if hidden_out { exp + 1 } else { 1 }, 0)
    } else {
        (if hidden_out { exp } else { 0 }, r.value)
    }
}

/// FP4 E2M1 → FP9. Lossless.
pub fn fp4_to_fp9(bits: u8) -> u16 {
    let s = u16::from((bits >> 3) & 1);
    let e = u16::from((bits >> 1) & 0x3);
    let m = u16::from(bits & 1);
    match (e, m) {
        (3, 1) => (s << 8) | (0x1F << 3) | 0x4,
        (3, 0) => (s << 8) | (0x1F << 3),
        (0, 0) => s << 8,
        // The single FP4 subnormal encodes 0.5, a normal FP9 value.
        (0, 1) => (s << 8) | (14 << 3),
        _ => (s << 8) | ((e + 14) << 3) | (m << 2),
    }
}

/// FP8 E4M3 → FP9. Lossless; (15, 7) is the only E4M3 NaN.
pub fn fp8_e4m3_to_fp9(bits: u8) -> u16 {
    let s = u16::from((bits >> 7) & 1);
    let e = u16::from((bits >> 3) & 0xF);
    let m = u16::from(bits & 0x7);
    if e == 15 && m == 7 {
        return (s << 8) | (0x1F << 3) | 0x4;
    }
    if e == 0 {
        if m == 0 {
            return s << 8;
        }
        let lz = leading_zeros(u64::from(m), 3) as u16;
        let norm = (m << (lz + 1)) & 0x7;
        return (s << 8) | ((8 - lz) << 3) | norm;
    }
    (s << 8) | ((e + 8) << 3) | m
}

/// FP8 E5M2 → FP9. Same exponent range; the mantissa widens by one bit.
pub fn fp8_e5m2_to_fp9(bits: u8) -> u16 {
    let s = u16::from((bits >> 7) & 1);
    let e = u16::from((bits >> 2) & 0x1F);
    let m = u16::from(bits & 0x3);
    (s << 8) | (e << 3) | (m << 1)
}

/// FP16 → FP9: the mantissa narrows from 10 to 3 bits with rounding.
pub fn fp16_to_fp9(bits: u16, rm: RoundingMode) -> u16 {
    let s = (bits >> 15) & 1;
    let e = u32::from((bits >> 10) & 0x1F);
    let m = bits & 0x3FF;
    if e == 0x1F {
        if m == 0 {
            return (s << 8) | (0x1F << 3);
        }
        return (s << 8) | (0x1F << 3) | 0x4 | ((m >> 7) & 0x3);
    }
    let (exp, mant) = round_finite(s == 1, e, u64::from(m), 10, 15, 3, 15, rm);
    if exp >= 0x1F {
        return if rm.overflow_to_max_finite(s == 1) {
            (s << 8) | (30 << 3) | 0x7
        } else {
            (s << 8) | (0x1F << 3)
        };
    }
    (s << 8) | ((exp as u16) << 3) | mant as u16
}

/// FP9 → FP13: four zero bits pad the mantissa. Lossless for every encoding,
/// specials included.
pub fn fp9_to_fp13(bits: u16) -> u16 {
    (bits << 4) & 0x1FFF
}

/// FP13 → FP9: the mantissa narrows from 7 to 3 bits with rounding.
pub fn fp13_to_fp9(bits: u16, rm: RoundingMode) -> u16 {
    let s = (bits >> 12) & 1;
    let e = u32::from((bits >> 7) & 0x1F);
    let m = bits & 0x7F;
    if e == 0x1F {
        if m == 0 {
            return (s << 8) | (0x1F << 3);
        }
        return (s << 8) | (0x1F << 3) | 0x4 | ((m >> 4) & 0x3);
    }
    let (exp, mant) = round_finite(s == 1, e, u64::from(m), 7, 15, 3, 15, rm);
    if exp >= 0x1F {
        return if rm.overflow_to_max_finite(s == 1) {
            (s << 8) | (30 << 3) | 0x7
        } else {
            (s << 8) | (0x1F << 3)
        };
    }
    (s << 8) | ((exp as u16) << 3) | mant as u16
}

/// FP9 → FP22. Lossless; subnormals renormalize into the wider exponent
/// range.
pub fn fp9_to_fp22(bits: u16) -> u32 {
    let s = u32::from((bits >> 8) & 1);
    let e = u32::from((bits >> 3) & 0x1F);
    let m = u32::from(bits & 0x7);
    if e == 0x1F {
        if m == 0 {
            return (s << 21) | (0xFF << 13);
        }
        return (s << 21) | (0xFF << 13) | 0x1000 | (m << 10);
    }
    if e == 0 {
        if m == 0 {
            return s << 21;
        }
        let lz = leading_zeros(u64::from(m), 3);
        let norm = (m << (lz + 1)) & 0x7;
        return (s << 21) | ((112 - lz) << 13) | (norm << 10);
    }
    (s << 21) | ((e + 112) << 13) | (m << 10)
}

/// FP13 → FP22. Lossless.
pub fn fp13_to_fp22(bits: u16) -> u32 {
    let s = u32::from((bits >> 12) & 1);
    let e = u32::from((bits >> 7) & 0x1F);
    let m = u32::from(bits & 0x7F);
    if e == 0x1F {
        if m == 0 {
            return (s << 21) | (0xFF << 13);
        }
        return (s << 21) | (0xFF << 13) | 0x1000 | (m << 6);
    }
    if e == 0 {
        if m == 0 {
            return s << 21;
        }
        let lz = leading_zeros(u64::from(m), 7);
        let norm = (m << (lz + 1)) & 0x7F;
        return (s << 21) | ((112 - lz) << 13) | (norm << 6);
    }
    (s << 21) | ((e + 112) << 13) | (m << 6)
}

/// FP16 → FP22. Lossless.
pub fn fp16_to_fp22(bits: u16) -> u32 {
    let s = u32::from((bits >> 15) & 1);
    let e = u32::from((bits >> 10) & 0x1F);
    let m = u32::from(bits & 0x3FF);
    if e == 0x1F {
        if m == 0 {
            return (s << 21) | (0xFF << 13);
        }
        return (s << 21) | (0xFF << 13) | 0x1000 | (m << 3);
    }
    if e == 0 {
        if m == 0 {
            return s << 21;
        }
        let lz = leading_zeros(u64::from(m), 10);
        let norm = (m << (lz + 1)) & 0x3FF;
        return (s << 21) | ((112 - lz) << 13) | (norm << 3);
    }
    (s << 21) | ((e + 112) << 13) | (m << 3)
}

/// FP22 → FP8 E4M3. No infinity in the target: Inf and every overflow
/// saturate to (e=14, m=7) regardless of rounding mode.
pub fn fp22_to_fp8_e4m3(bits: u32, rm: RoundingMode) -> u8 {
    let s = ((bits >> 21) & 1) as u8;
    let e = (bits >> 13) & 0xFF;
    let m = bits & 0x1FFF;
    if e == 0xFF {
        if m != 0 {
            return (s << 7) | 0x7F;
        }
        return (s << 7) | (14 << 3) | 0x7;
    }
    let (exp, mant) = round_finite(s == 1, e, u64::from(m), 13, 127, 3, 7, rm);
    if exp >= 15 {
        return (s << 7) | (14 << 3) | 0x7;
    }
    (s << 7) | ((exp as u8) << 3) | mant as u8
}

/// FP22 → FP8 E5M2.
pub fn fp22_to_fp8_e5m2(bits: u32, rm: RoundingMode) -> u8 {
    let s = ((bits >> 21) & 1) as u8;
    let e = (bits >> 13) & 0xFF;
    let m = bits & 0x1FFF;
    if e == 0xFF {
        if m == 0 {
            return (s << 7) | (0x1F << 2);
        }
        return (s << 7) | (0x1F << 2) | 0x2 | ((m >> 11) & 1) as u8;
    }
    let (exp, mant) = round_finite(s == 1, e, u64::from(m), 13, 127, 2, 15, rm);
    if exp >= 0x1F {
        return if rm.overflow_to_max_finite(s == 1) {
            (s << 7) | (30 << 2) | 0x3
        } else {
            (s << 7) | (0x1F << 2)
        };
    }
    (s << 7) | ((exp as u8) << 2) | mant as u8
}

/// FP22 → FP16.
pub fn fp22_to_fp16(bits: u32, rm: RoundingMode) -> u16 {
    let s = ((bits >> 21) & 1) as u16;
    let e = (bits >> 13) & 0xFF;
    let m = bits & 0x1FFF;
    if e == 0xFF {
        if m == 0 {
            return (s << 15) | (0x1F << 10);
        }
        return (s << 15) | (0x1F << 10) | 0x200 | (m >> 3) as u16;
    }
    let (exp, mant) = round_finite(s == 1, e, u64::from(m), 13, 127, 10, 15, rm);
    if exp >= 0x1F {
        return if rm.overflow_to_max_finite(s == 1) {
            (s << 15) | (30 << 10) | 0x3FF
        } else {
            (s << 15) | (0x1F << 10)
        };
    }
    (s << 15) | ((exp as u16) << 10) | mant as u16
}

/// FP22 → FP32: an exact bit-field remap. FP22 subnormals land in the FP32
/// subnormal range unchanged in value.
pub fn fp22_to_fp32(bits: u32) -> u32 {
    let s = (bits >> 21) & 1;
    let e = (bits >> 13) & 0xFF;
    let m = bits & 0x1FFF;
    (s << 31) | (e << 23) | (m << 10)
}

/// Converts one A/B element from its storage format to the FP9 datapath
/// format.
///
/// # Errors
///
/// Returns [`SimError::UnsupportedInputFormat`] for formats the front end
/// does not accept.
pub fn input_to_fp9(bits: u32, format: Format, rm: RoundingMode) -> Result<u16, SimError> {
    match format {
        Format::Fp4E2m1 => Ok(fp4_to_fp9((bits & 0xF) as u8)),
        Format::Fp8E4m3 => Ok(fp8_e4m3_to_fp9((bits & 0xFF) as u8)),
        Format::Fp8E5m2 => Ok(fp8_e5m2_to_fp9((bits & 0xFF) as u8)),
        Format::Fp16 => Ok(fp16_to_fp9((bits & 0xFFFF) as u16, rm)),
        other => Err(SimError::UnsupportedInputFormat(other)),
    }
}

/// Converts one C bias element to the FP22 accumulator format.
///
/// The FP8 and FP4 formats route through FP9; FP16 widens directly.
///
/// # Errors
///
/// Returns [`SimError::UnsupportedInputFormat`] for formats the front end
/// does not accept.
pub fn bias_to_fp22(bits: u32, format: Format, rm: RoundingMode) -> Result<u32, SimError> {
    match format {
        Format::Fp4E2m1 | Format::Fp8E4m3 | Format::Fp8E5m2 => {
            Ok(fp9_to_fp22(input_to_fp9(bits, format, rm)?))
        }
        Format::Fp16 => Ok(fp16_to_fp22((bits & 0xFFFF) as u16)),
        other => Err(SimError::UnsupportedInputFormat(other)),
    }
}

/// Converts an FP22 accumulator value to the requested output format.
///
/// # Errors
///
/// Returns [`SimError::UnsupportedOutputFormat`] for formats the back end
/// does not produce.
pub fn fp22_to_output(bits: u32, format: Format, rm: RoundingMode) -> Result<u32, SimError> {
    match format {
        Format::Fp8E4m3 => Ok(u32::from(fp22_to_fp8_e4m3(bits, rm))),
        Format::Fp8E5m2 => Ok(u32::from(fp22_to_fp8_e5m2(bits, rm))),
        Format::Fp16 => Ok(u32::from(fp22_to_fp16(bits, rm))),
        Format::Fp32 => Ok(fp22_to_fp32(bits)),
        other => Err(SimError::UnsupportedOutputFormat(other)),
    }
}

/// General conversion dispatcher over every pair the datapath uses.
///
/// # Errors
///
/// Returns [`SimError::UnsupportedConversion`] when no route exists between
/// the two formats.
pub fn convert(bits: u64, src: Format, dst: Format, rm: RoundingMode) -> Result<u64, SimError> {
    use Format::*;
    let b = bits & src.mask();
    let out = match (src, dst) {
        (Fp4E2m1, Fp9) => u64::from(fp4_to_fp9(b as u8)),
        (Fp8E4m3, Fp9) => u64::from(fp8_e4m3_to_fp9(b as u8)),
        (Fp8E5m2, Fp9) => u64::from(fp8_e5m2_to_fp9(b as u8)),
        (Fp16, Fp9) => u64::from(fp16_to_fp9(b as u16, rm)),
        (Fp9, Fp13) => u64::from(fp9_to_fp13(b as u16)),
        (Fp13, Fp9) => u64::from(fp13_to_fp9(b as u16, rm)),
        (Fp9, Fp22) => u64::from(fp9_to_fp22(b as u16)),
        (Fp13, Fp22) => u64::from(fp13_to_fp22(b as u16)),
        (Fp16, Fp22) => u64::from(fp16_to_fp22(b as u16)),
        (Fp4E2m1, Fp22) => u64::from(fp9_to_fp22(fp4_to_fp9(b as u8))),
        (Fp8E4m3, Fp22) => u64::from(fp9_to_fp22(fp8_e4m3_to_fp9(b as u8))),
        (Fp8E5m2, Fp22) => u64::from(fp9_to_fp22(fp8_e5m2_to_fp9(b as u8))),
        (Fp22, Fp8E4m3) => u64::from(fp22_to_fp8_e4m3(b as u32, rm)),
        (Fp22, Fp8E5m2) => u64::from(fp22_to_fp8_e5m2(b as u32, rm)),
        (Fp22, Fp16) => u64::from(fp22_to_fp16(b as u32, rm)),
        (Fp22, Fp32) => u64::from(fp22_to_fp32(b as u32)),
        (src, dst) => return Err(SimError::UnsupportedConversion(src, dst)),
    };
    Ok(out)
}
