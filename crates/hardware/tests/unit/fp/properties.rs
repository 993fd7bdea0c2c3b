//! Property-based invariants over the arithmetic surface.
//!
//! Every primitive must terminate and stay inside its declared width for
//! arbitrary input bit patterns, and the pipelined engine must agree with
//! the reference model bit-for-bit on arbitrary jobs.

use proptest::prelude::*;

use otc_core::config::Config;
use otc_core::fp::add::{fp22_add, fp9_add};
use otc_core::fp::convert::{fp16_to_fp22, fp22_to_fp16, fp9_to_fp13, fp13_to_fp9, fp9_to_fp22};
use otc_core::fp::mul::fp9_mul;
use otc_core::fp::rounding::RoundingMode;
use otc_core::reference::reference_matmul;
use otc_core::TensorCore;

fn any_rm() -> impl Strategy<Value = RoundingMode> {
    prop::sample::select(RoundingMode::ALL.to_vec())
}

proptest! {
    #[test]
    fn fp9_mul_is_total_and_width_closed(a in 0u16..0x200, b in 0u16..0x200, rm in any_rm()) {
        let out = fp9_mul(a, b, rm);
        prop_assert_eq!(out & !0x1FF, 0);
    }

    #[test]
    fn fp9_add_is_total_and_width_closed(a in 0u16..0x200, b in 0u16..0x200, rm in any_rm()) {
        let out = fp9_add(a, b, rm);
        prop_assert_eq!(out & !0x1FF, 0);
    }

    #[test]
    fn fp9_add_commutes(a in 0u16..0x200, b in 0u16..0x200, rm in any_rm()) {
        prop_assert_eq!(fp9_add(a, b, rm), fp9_add(b, a, rm));
    }

    #[test]
    fn fp22_add_is_total_and_width_closed(a in 0u32..0x40_0000, b in 0u32..0x40_0000, rm in any_rm()) {
        let out = fp22_add(a, b, rm);
        prop_assert_eq!(out & !0x3F_FFFF, 0);
    }

    #[test]
    fn fp9_widening_round_trips(bits in 0u16..0x200) {
        let e = (bits >> 3) & 0x1F;
        prop_assume!(e != 0x1F);
        prop_assert_eq!(fp13_to_fp9(fp9_to_fp13(bits), RoundingMode::Rne), bits);
    }

    #[test]
    fn fp16_round_trips_through_the_accumulator_format(bits in 0u16..) {
        prop_assume!((bits >> 10) & 0x1F != 0x1F);
        prop_assert_eq!(fp22_to_fp16(fp16_to_fp22(bits), RoundingMode::Rne), bits);
    }

    #[test]
    fn conversions_are_width_closed(bits in 0u16..0x200) {
        prop_assert_eq!(fp9_to_fp22(bits) & !0x3F_FFFF, 0);
        prop_assert_eq!(fp9_to_fp13(bits) & !0x1FFF, 0);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn pipelined_path_matches_the_reference_model(
        a in prop::collection::vec(0u16..0x200, 64),
        b in prop::collection::vec(0u16..0x200, 64),
        c in prop::collection::vec(0u32..0x40_0000, 64),
        rm in any_rm(),
    ) {
        let config = Config::default();
        let shape = config.shape;
        let want = reference_matmul(&a, &b, &c, &shape, rm).unwrap();

        let mut core = TensorCore::new(&config).unwrap();
        core.load(
            &a,
            &b,
            &c,
            config.job.input_format,
            config.job.output_format,
            rm,
        )
        .unwrap();
        let cycles = core.run_to_completion(config.sim.max_cycles).unwrap();
        prop_assert_eq!(cycles, config.pipeline_depth());

        for i in 0..shape.m {
            for j in 0..shape.n {
                prop_assert_eq!(
                    core.result_fp22(i, j),
                    Some(want[i * shape.n + j]),
                    "cell ({}, {})", i, j
                );
            }
        }
    }
}
