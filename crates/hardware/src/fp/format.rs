//! Packed floating-point format descriptors.
//!
//! Each format packs sign, exponent, and mantissa MSB-to-LSB into the
//! smallest unsigned integer that holds it: FP4 in 4 bits, FP8 in 8, FP9 in a
//! `u16`, FP13 in a `u16`, FP16 in 16 bits, FP22 in a `u32`, FP32 in 32 bits.
//!
//! Encoding rules shared by every format: exponent all-zeros with a zero
//! mantissa is signed zero; all-zeros with a non-zero mantissa is a subnormal
//! (hidden bit 0); exponent all-ones is Inf (mantissa zero) or NaN, with the
//! mantissa MSB as the quiet bit. Two formats deviate: FP4 places Inf at
//! (e=3, m=0) and NaN at (e=3, m=1), and FP8 E4M3 has no Inf: its only NaN
//! is (e=15, m=7) and overflow saturates to (e=14, m=7).

use serde::Deserialize;
use std::fmt;

/// Identifies one of the packed floating-point encodings used by the
/// datapath.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    /// FP4 E2M1: 1-bit sign, 2-bit exponent, 1-bit mantissa, bias 1.
    Fp4E2m1,
    /// FP8 E4M3: 1/4/3, bias 7. No Inf; (15, 7) is NaN.
    Fp8E4m3,
    /// FP8 E5M2: 1/5/2, bias 15, IEEE-style specials.
    Fp8E5m2,
    /// FP9 E5M3: 1/5/3, bias 15. The internal multiply/add format.
    Fp9,
    /// FP13 E5M7: 1/5/7, bias 15. The widened add-tree operand format.
    Fp13,
    /// FP16: IEEE half, 1/5/10, bias 15.
    Fp16,
    /// FP22 E8M13: 1/8/13, bias 127. The accumulator format.
    Fp22,
    /// FP32: IEEE single, 1/8/23, bias 127.
    Fp32,
}

impl Format {
    /// Exponent field width in bits.
    pub fn exp_bits(self) -> u32 {
        match self {
            Format::Fp4E2m1 => 2,
            Format::Fp8E4m3 => 4,
            Format::Fp8E5m2 | Format::Fp9 | Format::Fp13 | Format::Fp16 => 5,
            Format::Fp22 | Format::Fp32 => 8,
        }
    }

    /// Mantissa field width in bits (hidden bit excluded).
    pub fn mantissa_bits(self) -> u32 {
        match self {
            Format::Fp4E2m1 => 1,
            Format::Fp8E5m2 => 2,
            Format::Fp8E4m3 | Format::Fp9 => 3,
            Format::Fp13 => 7,
            Format::Fp16 => 10,
            Format::Fp22 => 13,
            Format::Fp32 => 23,
        }
    }

    /// Exponent bias.
    pub fn bias(self) -> i32 {
        match self {
            Format::Fp4E2m1 => 1,
            Format::Fp8E4m3 => 7,
            Format::Fp8E5m2 | Format::Fp9 | Format::Fp13 | Format::Fp16 => 15,
            Format::Fp22 | Format::Fp32 => 127,
        }
    }

    /// Total encoded width in bits, sign included.
    pub fn total_bits(self) -> u32 {
        1 + self.exp_bits() + self.mantissa_bits()
    }

    /// Bit mask covering the encoded width.
    pub fn mask(self) -> u64 {
        (1u64 << self.total_bits()) - 1
    }

    /// True for the formats the conversion front end accepts for A and B.
    pub fn is_input_format(self) -> bool {
        matches!(
            self,
            Format::Fp4E2m1 | Format::Fp8E4m3 | Format::Fp8E5m2 | Format::Fp16
        )
    }

    /// True for the formats the back-end converter produces for D (and
    /// accepts for C).
    pub fn is_output_format(self) -> bool {
        matches!(
            self,
            Format::Fp8E4m3 | Format::Fp8E5m2 | Format::Fp16 | Format::Fp32
        )
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Fp4E2m1 => "FP4_E2M1",
            Format::Fp8E4m3 => "FP8_E4M3",
            Format::Fp8E5m2 => "FP8_E5M2",
            Format::Fp9 => "FP9",
            Format::Fp13 => "FP13",
            Format::Fp16 => "FP16",
            Format::Fp22 => "FP22",
            Format::Fp32 => "FP32",
        };
        f.write_str(name)
    }
}
