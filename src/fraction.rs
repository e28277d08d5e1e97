/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Bounded fraction in `[0, 1]` with epsilon-aware comparisons.

use core::fmt;

use crate::error::{PartitionError, Result};
use crate::tolerance::ROUNDING_SLACK;

/// A value in `[0, 1]`.
///
/// Construction rejects anything outside the interval (including NaN), so a
/// `UnitFraction` in hand is always a valid share of a whole.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct UnitFraction(f64);

impl UnitFraction {
    /// The empty share.
    pub const ZERO: Self = Self(0.0);
    /// The whole.
    pub const ONE: Self = Self(1.0);

    /// Wrap `value`, failing if it is not in `[0, 1]`.
    pub fn new(value: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(PartitionError::FractionOutOfRange { value })
        }
    }

    /// Like [`UnitFraction::new`], but clamps overshoots of at most
    /// [`ROUNDING_SLACK`] onto the nearest bound.
    fn new_absorbing_rounding(value: f64) -> Result<Self> {
        if value < 0.0 && value >= -ROUNDING_SLACK {
            Ok(Self::ZERO)
        } else if value > 1.0 && value <= 1.0 + ROUNDING_SLACK {
            Ok(Self::ONE)
        } else {
            Self::new(value)
        }
    }

    /// The raw value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// The value as a percentage in `[0, 100]`.
    pub fn percent(self) -> f64 {
        self.0 * 100.0
    }

    /// `self + other`; fails if the result exceeds one.
    pub fn sum(self, other: Self) -> Result<Self> {
        Self::new_absorbing_rounding(self.0 + other.0)
    }

    /// `self - other`; fails if the result is negative.
    pub fn subtract(self, other: Self) -> Result<Self> {
        Self::new_absorbing_rounding(self.0 - other.0)
    }

    /// Exactly zero.
    pub fn is_zero(self) -> bool {
        self.0 == 0.0
    }

    /// Within `epsilon` of zero.
    pub fn is_almost_zero(self, epsilon: f64) -> bool {
        self.0 <= epsilon
    }

    /// Within `epsilon` of `other`.
    pub fn almost_equals(self, other: Self, epsilon: f64) -> bool {
        (self.0 - other.0).abs() <= epsilon
    }

    /// Unbounded `f64` total of a sequence of fractions.
    pub fn total<I: IntoIterator<Item = Self>>(fractions: I) -> f64 {
        fractions.into_iter().map(|f| f.0).sum()
    }
}

impl TryFrom<f64> for UnitFraction {
    type Error = PartitionError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<UnitFraction> for f64 {
    fn from(f: UnitFraction) -> f64 {
        f.0
    }
}

/// Renders as a percentage with two decimals, e.g. `12.50%`.
impl fmt::Display for UnitFraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.percent())
    }
}
