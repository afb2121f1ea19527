//! Quality and speed settings
//!
//! The operator picks a single quality in `1..=100` (higher is better). Each
//! encoder describes its own internal range as a [`QualityScale`]; the
//! mapping between the two is linear, clamped and monotonic:
//!
//! ```text
//! internal = worst + (best - worst) * (q - 1) / 99   (rounded to nearest)
//! ```
//!
//! so `q = 1` always lands on `worst` and `q = 100` on `best`, whichever
//! direction the encoder's scale runs.

use crate::error::ConfigError;
use std::fmt;

/// User-facing quality, validated to `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;
    pub const DEFAULT: Quality = Quality(80);

    pub fn new(value: i64) -> Result<Self, ConfigError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ConfigError::QualityOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encoder speed, `1` (slowest, smallest) to `10` (fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Speed(u8);

impl Speed {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;
    pub const DEFAULT: Speed = Speed(4);

    pub fn new(value: i64) -> Result<Self, ConfigError> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ConfigError::SpeedOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Speed {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// An encoder's internal quality range. `best` may be numerically smaller
/// than `worst` (quantizers run backwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityScale {
    pub best: i32,
    pub worst: i32,
}

impl QualityScale {
    /// AV1 quantizer: 0 is lossless-ish, 63 is the coarsest.
    pub const AV1_QUANTIZER: QualityScale = QualityScale { best: 0, worst: 63 };
    /// ravif's 1..=100 quality knob.
    pub const RAVIF: QualityScale = QualityScale {
        best: 100,
        worst: 1,
    };

    pub const fn new(best: i32, worst: i32) -> Self {
        Self { best, worst }
    }

    pub fn map(&self, quality: Quality) -> i32 {
        let span = (self.best - self.worst) as f64;
        let step = (quality.get() - Quality::MIN) as f64 / (Quality::MAX - Quality::MIN) as f64;
        let raw = (self.worst as f64 + span * step).round() as i32;
        raw.clamp(self.best.min(self.worst), self.best.max(self.worst))
    }

    pub fn contains(&self, value: i32) -> bool {
        value >= self.best.min(self.worst) && value <= self.best.max(self.worst)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn q(v: i64) -> Quality {
        Quality::new(v).unwrap()
    }

    #[test]
    fn test_quality_bounds() {
        assert!(Quality::new(0).is_err());
        assert!(Quality::new(101).is_err());
        assert!(Quality::new(-5).is_err());
        assert_eq!(q(1).get(), 1);
        assert_eq!(q(100).get(), 100);
        assert_eq!(Quality::default().get(), 80);
        assert_eq!(
            Quality::new(250),
            Err(ConfigError::QualityOutOfRange(250))
        );
    }

    #[test]
    fn test_speed_bounds() {
        assert!(Speed::new(0).is_err());
        assert!(Speed::new(11).is_err());
        assert_eq!(Speed::default().get(), 4);
        assert_eq!(Speed::new(10).unwrap().get(), 10);
    }

    #[test]
    fn test_av1_quantizer_endpoints() {
        let scale = QualityScale::AV1_QUANTIZER;
        assert_eq!(scale.map(q(1)), 63);
        assert_eq!(scale.map(q(100)), 0);
        assert_eq!(scale.map(q(80)), 13);
    }

    #[test]
    fn test_ravif_scale_is_identity() {
        for v in 1..=100 {
            assert_eq!(QualityScale::RAVIF.map(q(v)), v as i32);
        }
    }

    proptest! {
        #[test]
        fn prop_mapping_in_range(v in 1i64..=100, best in -100i32..100, worst in -100i32..100) {
            let scale = QualityScale::new(best, worst);
            prop_assert!(scale.contains(scale.map(q(v))));
        }

        #[test]
        fn prop_mapping_monotonic(a in 1i64..=100, b in 1i64..=100) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            for scale in [QualityScale::AV1_QUANTIZER, QualityScale::RAVIF] {
                let (better, worse) = (scale.map(q(hi)), scale.map(q(lo)));
                if scale.best <= scale.worst {
                    prop_assert!(better <= worse);
                } else {
                    prop_assert!(better >= worse);
                }
            }
        }

        #[test]
        fn prop_out_of_range_rejected(v in prop_oneof![i64::MIN..1i64, 101i64..i64::MAX]) {
            prop_assert_eq!(Quality::new(v), Err(ConfigError::QualityOutOfRange(v)));
        }
    }
}
