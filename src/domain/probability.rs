//! Fixed-point probability arithmetic.
//!
//! Variant weights are stored and summed as integer parts-per-million so that
//! budget checks are exact at the boundary: `0.1 + 0.2 + 0.7` is exactly `1.0`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use crate::domain::ledger::LedgerError;

/// Number of fixed-point units in a probability of `1.0`.
pub const SCALE: u32 = 1_000_000;

/// A probability in `[0.0, 1.0]` stored as parts-per-million.
///
/// Sums of probabilities may temporarily exceed `1.0` (that is how an
/// over-budget proposal is detected), so the inner value is only bounded
/// by [`Probability::is_valid`], not by construction through [`Add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Probability(u32);

impl Probability {
    pub const ZERO: Probability = Probability(0);
    pub const ONE: Probability = Probability(SCALE);

    /// Builds a probability from raw parts-per-million.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::OutOfRange`] if `ppm` exceeds [`SCALE`].
    pub fn from_ppm(ppm: u32) -> Result<Self, LedgerError> {
        if ppm > SCALE {
            return Err(LedgerError::OutOfRange {
                value: f64::from(ppm) / f64::from(SCALE),
            });
        }
        Ok(Self(ppm))
    }

    /// Converts a floating-point probability, rounding to the nearest ppm.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::OutOfRange`] for NaN, infinities and values
    /// outside `[0.0, 1.0]`.
    pub fn from_f64(value: f64) -> Result<Self, LedgerError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(LedgerError::OutOfRange { value });
        }
        let ppm = (value * f64::from(SCALE)).round() as u32;
        Self::from_ppm(ppm)
    }

    /// Raw parts-per-million.
    pub fn ppm(self) -> u32 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / f64::from(SCALE)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// True when the value lies within `[0.0, 1.0]`.
    pub fn is_valid(self) -> bool {
        self.0 <= SCALE
    }

    /// Probability mass left for the primary destination, saturating at zero.
    pub fn remaining(self) -> Probability {
        Probability(SCALE.saturating_sub(self.0))
    }
}

impl Add for Probability {
    type Output = Probability;

    fn add(self, rhs: Probability) -> Probability {
        Probability(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Probability {
    fn sum<I: Iterator<Item = Probability>>(iter: I) -> Probability {
        iter.fold(Probability::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Probability> for Probability {
    fn sum<I: Iterator<Item = &'a Probability>>(iter: I) -> Probability {
        iter.copied().sum()
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.as_f64())
    }
}

impl Serialize for Probability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Probability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Probability::from_f64(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(value: f64) -> Probability {
        Probability::from_f64(value).unwrap()
    }

    #[test]
    fn test_decimal_sum_is_exact() {
        let total: Probability = [p(0.1), p(0.2), p(0.7)].iter().sum();
        assert_eq!(total, Probability::ONE);
    }

    #[test]
    fn test_from_f64_rounds_to_nearest_ppm() {
        assert_eq!(p(0.3).ppm(), 300_000);
        assert_eq!(p(0.1234564).ppm(), 123_456);
        assert_eq!(p(0.1234566).ppm(), 123_457);
    }

    #[test]
    fn test_from_f64_bounds() {
        assert_eq!(p(0.0), Probability::ZERO);
        assert_eq!(p(1.0), Probability::ONE);
        assert!(Probability::from_f64(-0.01).is_err());
        assert!(Probability::from_f64(1.01).is_err());
        assert!(Probability::from_f64(f64::NAN).is_err());
        assert!(Probability::from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn test_from_ppm_rejects_above_scale() {
        assert!(Probability::from_ppm(SCALE).is_ok());
        assert!(matches!(
            Probability::from_ppm(SCALE + 1),
            Err(LedgerError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_remaining() {
        assert_eq!(p(0.7).remaining(), p(0.3));
        assert_eq!(Probability::ONE.remaining(), Probability::ZERO);
        let over = p(0.7) + p(0.6);
        assert!(!over.is_valid());
        assert_eq!(over.remaining(), Probability::ZERO);
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&p(0.25)).unwrap();
        assert_eq!(json, "0.25");

        let parsed: Probability = serde_json::from_str("0.7").unwrap();
        assert_eq!(parsed.ppm(), 700_000);

        assert!(serde_json::from_str::<Probability>("1.5").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(p(0.3).to_string(), "0.3000");
    }
}
