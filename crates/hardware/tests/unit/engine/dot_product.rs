//! Dot-product unit tests.
//!
//! One unit computes one output element; these tests pin its latency and its
//! latched-result behavior.

use otc_core::core::DotProductUnit;
use otc_core::fp::rounding::RoundingMode;

use crate::common::{FP22_ONE, FP9_ONE};

const RNE: RoundingMode = RoundingMode::Rne;

/// Ticks a unit until it publishes, returning (cycles, value).
fn run_unit(unit: &mut DotProductUnit, a: &[u16], b: &[u16], c: u32, limit: u32) -> (u32, u32) {
    for cycle in 1..=limit {
        if let Some(v) = unit.tick(Some((a, b)), c, RNE) {
            return (cycle, v);
        }
    }
    panic!("unit did not publish within {} cycles", limit);
}

#[test]
fn k8_unit_publishes_after_eleven_cycles() {
    let mut unit = DotProductUnit::new(8);
    let mut a = [0u16; 8];
    let mut b = [0u16; 8];
    a[0] = FP9_ONE;
    b[0] = FP9_ONE;
    let (cycles, value) = run_unit(&mut unit, &a, &b, 0, 32);
    assert_eq!(cycles, 11, "2 mul + 3×2 tree + 2 accumulate + 1 convert");
    assert_eq!(value, FP22_ONE);
    assert!(unit.is_done());
}

#[test]
fn k1_unit_skips_the_tree() {
    let mut unit = DotProductUnit::new(1);
    let (cycles, value) = run_unit(&mut unit, &[FP9_ONE], &[FP9_ONE], 0, 32);
    assert_eq!(cycles, 5, "2 mul + 2 accumulate + 1 convert");
    assert_eq!(value, FP22_ONE);
}

#[test]
fn result_latches_and_later_ticks_publish_nothing() {
    let mut unit = DotProductUnit::new(8);
    let a = [FP9_ONE; 8];
    let b = [FP9_ONE; 8];
    let (_, value) = run_unit(&mut unit, &a, &b, 0, 32);
    // Eight products of 1.0 reduce to 8.0.
    assert_eq!(value, (130 << 13));
    for _ in 0..20 {
        assert_eq!(unit.tick(Some((&a, &b)), 0, RNE), None);
        assert!(unit.is_done());
    }
}

#[test]
fn bias_is_added_to_the_reduction() {
    let mut unit = DotProductUnit::new(8);
    let mut a = [0u16; 8];
    let mut b = [0u16; 8];
    a[3] = FP9_ONE;
    b[3] = FP9_ONE;
    let (_, value) = run_unit(&mut unit, &a, &b, FP22_ONE, 32);
    assert_eq!(value, 128 << 13, "1·1 + 1 = 2");
}

#[test]
fn reset_returns_the_unit_to_idle() {
    let mut unit = DotProductUnit::new(8);
    let a = [FP9_ONE; 8];
    let b = [FP9_ONE; 8];
    run_unit(&mut unit, &a, &b, 0, 32);
    unit.reset();
    assert!(!unit.is_done());
    let (cycles, value) = run_unit(&mut unit, &a, &b, 0, 32);
    assert_eq!(cycles, 11);
    assert_eq!(value, 130 << 13);
}

#[test]
fn draining_without_inputs_never_publishes() {
    let mut unit = DotProductUnit::new(8);
    for _ in 0..32 {
        assert_eq!(unit.tick(None, 0, RNE), None);
    }
    assert!(!unit.is_done());
}
