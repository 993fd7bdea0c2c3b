//! Configuration structure tests.

use otc_core::config::{Config, ShapeConfig};
use otc_core::fp::format::Format;
use otc_core::fp::rounding::RoundingMode;
use otc_core::SimError;

#[test]
fn defaults_describe_the_canonical_core() {
    let config = Config::default();
    assert_eq!(config.shape.m, 8);
    assert_eq!(config.shape.k, 8);
    assert_eq!(config.shape.n, 8);
    assert_eq!(config.job.input_format, Format::Fp8E4m3);
    assert_eq!(config.job.rounding, RoundingMode::Rne);
    assert!(config.validate().is_ok());
}

#[test]
fn pipeline_depth_tracks_the_tree_depth() {
    let config = Config::default();
    assert_eq!(config.pipeline_depth(), 11, "2 + 3·2 + 2 + 1 for K = 8");

    let mut shallow = Config::default();
    shallow.shape.k = 1;
    assert_eq!(shallow.pipeline_depth(), 5, "no tree levels for K = 1");

    let mut wide = Config::default();
    wide.shape.k = 64;
    assert_eq!(wide.pipeline_depth(), 17);
}

#[test]
fn validation_rejects_bad_configs() {
    let mut config = Config::default();
    config.shape.n = 0;
    assert_eq!(config.validate(), Err(SimError::InvalidDimension("N", 0)));

    let mut config = Config::default();
    config.shape.k = 12;
    assert_eq!(config.validate(), Err(SimError::NonPowerOfTwoK(12)));

    let mut config = Config::default();
    config.job.input_format = Format::Fp32;
    assert_eq!(
        config.validate(),
        Err(SimError::UnsupportedInputFormat(Format::Fp32))
    );

    let mut config = Config::default();
    config.job.output_format = Format::Fp9;
    assert_eq!(
        config.validate(),
        Err(SimError::UnsupportedOutputFormat(Format::Fp9))
    );
}

#[test]
fn shape_helpers() {
    let shape = ShapeConfig { m: 4, k: 16, n: 2 };
    assert_eq!(shape.tree_depth(), 4);
    assert_eq!(shape.units(), 8);
}

#[test]
fn deserializes_from_json_with_defaults() {
    let config: Config = serde_json::from_str(
        r#"{
            "shape": { "k": 4 },
            "job": { "input_format": "fp16", "output_format": "fp32", "rounding": "rtz" },
            "sim": { "max_cycles": 64 }
        }"#,
    )
    .unwrap();
    assert_eq!(config.shape.m, 8, "omitted fields take defaults");
    assert_eq!(config.shape.k, 4);
    assert_eq!(config.job.input_format, Format::Fp16);
    assert_eq!(config.job.output_format, Format::Fp32);
    assert_eq!(config.job.rounding, RoundingMode::Rtz);
    assert_eq!(config.sim.max_cycles, 64);

    let empty: Config = serde_json::from_str("{}").unwrap();
    assert!(empty.validate().is_ok());
}
