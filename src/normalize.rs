//! Fixed-point angle normalization.
//!
//! Angles are signed integers in hundredths of a degree, always in the
//! half-open interval `(-18000, 18000]`. Conversion from encoder counts is an
//! exact integer multiply-then-divide; no floating point is involved, so the
//! wrap boundary and the rounding direction (truncation toward zero) are
//! reproducible bit for bit.
//!
//! | Resolution | Counts/turn | Scale      |
//! |------------|-------------|------------|
//! | 10 bit     | 1024        | 1125 / 32  |
//! | 12 bit     | 4096        | 1125 / 128 |
//! | 16 bit     | 65536       | 1125 / 2048|

use crate::consts::{FULL_TURN, HALF_TURN};
use crate::encoder::Resolution;

/// Rational factor from encoder counts to hundredths of a degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Scale {
    num: i32,
    den: i32,
}

impl Scale {
    /// `36000 / 1024` in lowest terms.
    pub const BITS_10: Scale = Scale { num: 1125, den: 32 };
    /// `36000 / 4096` in lowest terms.
    pub const BITS_12: Scale = Scale { num: 1125, den: 128 };
    /// `36000 / 65536` in lowest terms.
    pub const BITS_16: Scale = Scale { num: 1125, den: 2048 };

    /// Numerator of the factor.
    pub const fn numerator(self) -> i32 {
        self.num
    }

    /// Denominator of the factor.
    pub const fn denominator(self) -> i32 {
        self.den
    }
}

impl Resolution {
    /// Counts-to-angle factor for this resolution.
    pub const fn scale(self) -> Scale {
        match self {
            Resolution::Bits10 => Scale::BITS_10,
            Resolution::Bits12 => Scale::BITS_12,
            Resolution::Bits16 => Scale::BITS_16,
        }
    }
}

/// Folds an angle from `(-36000, 36000]` into `(-18000, 18000]` with at most
/// one correction.
pub const fn wrap(angle: i32) -> i32 {
    if angle > HALF_TURN {
        angle - FULL_TURN
    } else if angle <= -HALF_TURN {
        angle + FULL_TURN
    } else {
        angle
    }
}

/// Converts a raw reading into a signed angle relative to `reference`.
///
/// `raw` and `reference` must both be within the channel's resolution;
/// the result is then always in `(-18000, 18000]`.
pub fn normalize(raw: u16, reference: u16, scale: Scale) -> i32 {
    let diff = i32::from(raw) - i32::from(reference);
    wrap(diff * scale.num / scale.den)
}

/// Linear post-scale for a second axis coupled to the first through gearing.
///
/// The ratio may be negative (the axes turn opposite ways). Its magnitude is
/// limited to 2 so a single extra wrap brings the result back into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct GearRatio {
    num: i16,
    den: i16,
}

impl GearRatio {
    /// Axes turn together one to one.
    pub const IDENTITY: GearRatio = GearRatio { num: 1, den: 1 };
    /// Axes turn one to one in opposite directions.
    pub const INVERTED: GearRatio = GearRatio { num: -1, den: 1 };

    /// Builds the ratio `num / den`.
    ///
    /// # Returns
    /// `None` when `den` is zero or `|num / den| > 2`.
    pub const fn new(num: i16, den: i16) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let n = (num as i32).abs();
        let d = (den as i32).abs();
        if n > 2 * d {
            return None;
        }
        Some(GearRatio { num, den })
    }

    /// Applies the ratio to a normalized angle and wraps the result once.
    pub fn apply(self, angle: i32) -> i32 {
        wrap(angle * i32::from(self.num) / i32::from(self.den))
    }
}
