//! Host-float helpers for the test harness.
//!
//! Encode/decode between `f64` and the packed storage formats, used for test
//! vector generation, result display, and the advisory f32 golden matmul.
//! Only the harness touches host floating point; the core library is
//! bit-level throughout, so nothing here is part of the simulation
//! contract.

use otc_core::fp::format::Format;

/// Splits a positive finite `f64` into `(f, e)` with `v = f · 2^e` and
/// `f ∈ [1, 2)`.
fn frexp(v: f64) -> (f64, i32) {
    let bits = v.to_bits();
    let e = ((bits >> 52) & 0x7FF) as i32;
    if e == 0 {
        let (f, e2) = frexp(v * 2f64.powi(64));
        return (f, e2 - 64);
    }
    let f = f64::from_bits((bits & !(0x7FF << 52)) | (1023u64 << 52));
    (f, e - 1023)
}

/// Encodes a host double into a small packed format with round-to-nearest.
///
/// `no_inf` selects the FP8 E4M3 convention: no infinity, overflow clamps to
/// (max_exp − 1, all-ones mantissa), and the all-ones exponent with all-ones
/// mantissa is the NaN.
fn f64_to_packed(v: f64, exp_bits: u32, mant_bits: u32, bias: i32, no_inf: bool) -> u32 {
    let exp_ones = (1u32 << exp_bits) - 1;
    let mant_ones = (1u32 << mant_bits) - 1;
    let sign = u32::from(v.is_sign_negative());
    let pack = |e: u32, m: u32| (sign << (exp_bits + mant_bits)) | (e << mant_bits) | m;
    let saturated = if no_inf {
        pack(exp_ones - 1, mant_ones)
    } else {
        pack(exp_ones, 0)
    };

    if v.is_nan() {
        let quiet = if no_inf { mant_ones } else { 1 << (mant_bits - 1) };
        return (exp_ones << mant_bits) | quiet;
    }
    if v.is_infinite() {
        return saturated;
    }
    let a = v.abs();
    if a == 0.0 {
        return pack(0, 0);
    }

    let (f, e) = frexp(a);
    let be = e + bias;
    if be >= exp_ones as i32 {
        return saturated;
    }
    if be <= 0 {
        // Subnormal range: scale against the minimum exponent.
        let scaled = a / 2f64.powi(1 - bias) * 2f64.powi(mant_bits as i32);
        let m = scaled.round() as u32;
        if m == 0 {
            return pack(0, 0);
        }
        if m > mant_ones {
            return pack(1, 0);
        }
        return pack(0, m);
    }
    let mut be = be as u32;
    let mut m = ((f - 1.0) * 2f64.powi(mant_bits as i32)).round() as u32;
    if m > mant_ones {
        m = 0;
        be += 1;
        if be >= exp_ones {
            return saturated;
        }
    }
    pack(be, m)
}

/// Decodes a small packed format into a host double.
fn packed_to_f64(bits: u32, exp_bits: u32, mant_bits: u32, bias: i32, no_inf: bool) -> f64 {
    let exp_ones = (1u32 << exp_bits) - 1;
    let mant_ones = (1u32 << mant_bits) - 1;
    let sign = if (bits >> (exp_bits + mant_bits)) & 1 == 1 {
        -1.0
    } else {
        1.0
    };
    let e = (bits >> mant_bits) & exp_ones;
    let m = bits & mant_ones;
    if e == exp_ones {
        if no_inf {
            // E4M3: only the all-ones mantissa is NaN; the rest are finite.
            if m == mant_ones {
                return f64::NAN;
            }
        } else {
            return if m != 0 { f64::NAN } else { sign * f64::INFINITY };
        }
    }
    let frac = f64::from(m) / 2f64.powi(mant_bits as i32);
    if e == 0 {
        return sign * frac * 2f64.powi(1 - bias);
    }
    sign * (1.0 + frac) * 2f64.powi(e as i32 - bias)
}

/// Encodes a host double into raw storage bits for the given format.
pub fn encode(v: f64, format: Format) -> u32 {
    f64_to_packed(
        v,
        format.exp_bits(),
        format.mantissa_bits(),
        format.bias(),
        format == Format::Fp8E4m3,
    )
}

/// Decodes raw storage bits of the given format into a host double.
pub fn decode(bits: u32, format: Format) -> f64 {
    if format == Format::Fp32 {
        return f64::from(f32::from_bits(bits));
    }
    packed_to_f64(
        bits,
        format.exp_bits(),
        format.mantissa_bits(),
        format.bias(),
        format == Format::Fp8E4m3,
    )
}

/// The advisory f32 golden result: a plain fused loop over the raw inputs,
/// used only for relative-error reporting.
pub fn golden_f32_matmul(
    a_raw: &[u32],
    b_raw: &[u32],
    c_raw: &[u32],
    m: usize,
    k: usize,
    n: usize,
    format: Format,
) -> Vec<f64> {
    let mut out = vec![0.0; m * n];
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0f32;
            for kk in 0..k {
                let a = decode(a_raw[i * k + kk], format) as f32;
                let b = decode(b_raw[kk * n + j], format) as f32;
                acc += a * b;
            }
            let c = decode(c_raw[i * n + j], format) as f32;
            out[i * n + j] = f64::from(acc + c);
        }
    }
    out
}
