//! Deterministic test-vector generation.
//!
//! A small xorshift generator threaded explicitly through the harness (no
//! global RNG state) plus builders for random and structured jobs. Raw
//! matrices keep the storage-format bits for golden computation and display;
//! the converted FP9/FP22 copies are what the engine loads.

use otc_core::config::ShapeConfig;
use otc_core::fp::convert::{bias_to_fp22, input_to_fp9};
use otc_core::fp::format::Format;
use otc_core::fp::rounding::RoundingMode;

use crate::host;

/// 32-bit xorshift PRNG.
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    /// Seeds the generator; a zero seed is replaced to keep the sequence
    /// non-degenerate.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x2545_F491 } else { seed },
        }
    }

    /// Next raw 32-bit value.
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform double in `[lo, hi]` with 16 bits of resolution.
    pub fn next_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * f64::from(self.next_u32() & 0xFFFF) / 65535.0
    }
}

/// One generated job: raw storage bits plus the datapath encodings.
pub struct MatrixSet {
    pub a_raw: Vec<u32>,
    pub b_raw: Vec<u32>,
    pub c_raw: Vec<u32>,
    pub a_fp9: Vec<u16>,
    pub b_fp9: Vec<u16>,
    pub c_fp22: Vec<u32>,
}

/// Value range used for random elements of a format, sized so products and
/// sums stay mostly inside the narrow dynamic ranges.
fn value_range(format: Format) -> (f64, f64) {
    match format {
        Format::Fp4E2m1 => (-3.0, 3.0),
        Format::Fp8E4m3 => (-8.0, 8.0),
        Format::Fp8E5m2 => (-4.0, 4.0),
        _ => (-10.0, 10.0),
    }
}

/// Generates a random job in the given input format.
pub fn random_set(rng: &mut XorShift32, format: Format, shape: &ShapeConfig) -> MatrixSet {
    let (lo, hi) = value_range(format);
    let rm = RoundingMode::Rne;

    let mut gen_raw = |count: usize, scale: f64| -> Vec<u32> {
        (0..count)
            .map(|_| host::encode(rng.next_f64(lo * scale, hi * scale), format))
            .collect()
    };
    let a_raw = gen_raw(shape.m * shape.k, 1.0);
    let b_raw = gen_raw(shape.k * shape.n, 1.0);
    let c_raw = gen_raw(shape.m * shape.n, 0.5);

    let to_fp9 = |raw: &[u32]| -> Vec<u16> {
        raw.iter()
            .map(|&bits| input_to_fp9(bits, format, rm).expect("input format"))
            .collect()
    };
    MatrixSet {
        a_fp9: to_fp9(&a_raw),
        b_fp9: to_fp9(&b_raw),
        c_fp22: c_raw
            .iter()
            .map(|&bits| bias_to_fp22(bits, format, rm).expect("input format"))
            .collect(),
        a_raw,
        b_raw,
        c_raw,
    }
}

/// The identity job: `A = B = I`, `C = 0`.
pub fn identity_set(shape: &ShapeConfig) -> MatrixSet {
    let one = host::encode(1.0, Format::Fp8E4m3);
    let a_raw: Vec<u32> = (0..shape.m * shape.k)
        .map(|idx| {
            if idx / shape.k == idx % shape.k {
                one
            } else {
                0
            }
        })
        .collect();
    let b_raw: Vec<u32> = (0..shape.k * shape.n)
        .map(|idx| {
            if idx / shape.n == idx % shape.n {
                one
            } else {
                0
            }
        })
        .collect();
    let c_raw = vec![0u32; shape.m * shape.n];

    let rm = RoundingMode::Rne;
    let conv = |raw: &[u32]| -> Vec<u16> {
        raw.iter()
            .map(|&bits| input_to_fp9(bits, Format::Fp8E4m3, rm).expect("input format"))
            .collect()
    };
    MatrixSet {
        a_fp9: conv(&a_raw),
        b_fp9: conv(&b_raw),
        c_fp22: vec![0; shape.m * shape.n],
        a_raw,
        b_raw,
        c_raw,
    }
}

/// The zero job: `A = 0`, `B` random, `C = 0`.
pub fn zero_a_set(rng: &mut XorShift32, format: Format, shape: &ShapeConfig) -> MatrixSet {
    let mut set = random_set(rng, format, shape);
    set.a_raw.iter_mut().for_each(|v| *v = 0);
    set.a_fp9.iter_mut().for_each(|v| *v = 0);
    set.c_raw.iter_mut().for_each(|v| *v = 0);
    set.c_fp22.iter_mut().for_each(|v| *v = 0);
    set
}
