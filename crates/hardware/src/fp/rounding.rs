//! Rounding modes and the bit-level rounding primitive.
//!
//! The hardware defines five rounding modes:
//!
//! | Value | Mode | Description                             |
//! |-------|------|-----------------------------------------|
//! | 0b000 | RNE  | Round to Nearest, ties to Even          |
//! | 0b001 | RTZ  | Round towards Zero                      |
//! | 0b010 | RDN  | Round Down (towards −∞)                 |
//! | 0b011 | RUP  | Round Up (towards +∞)                   |
//! | 0b100 | RMM  | Round to Nearest, ties to Max Magnitude |
//!
//! Every rounding decision in the datapath (multiplier normalization, adder
//! result assembly, format narrowing) goes through [`round`], which
//! mirrors the RTL rounding module: the caller extracts the round bit and the
//! sticky OR of all lower bits from a wider value, and the primitive returns
//! the incremented significand together with its carry-out.

use serde::Deserialize;
use std::fmt;

/// Rounding mode selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum RoundingMode {
    /// Round to Nearest, ties to Even (default IEEE mode).
    Rne = 0b000,
    /// Round towards Zero.
    Rtz = 0b001,
    /// Round Down (towards −∞).
    Rdn = 0b010,
    /// Round Up (towards +∞).
    Rup = 0b011,
    /// Round to Nearest, ties to Max Magnitude.
    Rmm = 0b100,
}

impl RoundingMode {
    /// Decodes a 3-bit rounding mode field.
    ///
    /// Returns `None` for the reserved encodings (0b101–0b111).
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits & 0x7 {
            0b000 => Some(Self::Rne),
            0b001 => Some(Self::Rtz),
            0b010 => Some(Self::Rdn),
            0b011 => Some(Self::Rup),
            0b100 => Some(Self::Rmm),
            _ => None,
        }
    }

    /// All five modes, in encoding order. Handy for exhaustive tests.
    pub const ALL: [RoundingMode; 5] = [
        RoundingMode::Rne,
        RoundingMode::Rtz,
        RoundingMode::Rdn,
        RoundingMode::Rup,
        RoundingMode::Rmm,
    ];

    /// True when overflow saturates to the largest finite value instead of
    /// producing an infinity: RTZ always, RDN for positive results, RUP for
    /// negative results.
    pub(crate) fn overflow_to_max_finite(self, sign: bool) -> bool {
        matches!(
            (self, sign),
            (RoundingMode::Rtz, _) | (RoundingMode::Rdn, false) | (RoundingMode::Rup, true)
        )
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoundingMode::Rne => "RNE",
            RoundingMode::Rtz => "RTZ",
            RoundingMode::Rdn => "RDN",
            RoundingMode::Rup => "RUP",
            RoundingMode::Rmm => "RMM",
        };
        f.write_str(name)
    }
}

/// Result of one rounding step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rounded {
    /// The (possibly incremented) significand, modulo `2^width`.
    pub value: u64,
    /// True when any dropped bit was set.
    pub inexact: bool,
    /// Carry out of the top of the significand; the caller propagates it to
    /// the exponent.
    pub carry: bool,
    /// Whether the significand was incremented.
    pub round_up: bool,
}

/// Rounds a `width`-bit significand given the round bit and the sticky OR of
/// every bit below it.
///
/// The increment decision per mode:
/// - RNE: round bit set and (sticky or LSB set)
/// - RTZ: never
/// - RDN: negative and inexact
/// - RUP: positive and inexact
/// - RMM: round bit set
pub fn round(
    sig: u64,
    width: u32,
    sign: bool,
    round_bit: bool,
    sticky: bool,
    rm: RoundingMode,
) -> Rounded {
    debug_assert!(width >= 1 && width < 64);
    let mask = (1u64 << width) - 1;
    let sig = sig & mask;

    let inexact = round_bit || sticky;
    let round_up = match rm {
        RoundingMode::Rne => round_bit && (sticky || sig & 1 == 1),
        RoundingMode::Rtz => false,
        RoundingMode::Rdn => sign && inexact,
        RoundingMode::Rup => !sign && inexact,
        RoundingMode::Rmm => round_bit,
    };

    let sum = sig + u64::from(round_up);
    Rounded {
        value: sum & mask,
        inexact,
        carry: (sum >> width) & 1 == 1,
        round_up,
    }
}
