/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Numeric tolerances shared by partitions, modifications and the applier.
//!
//! Every component compares floating sums against the same constants, so a
//! partition that passes construction can never be rejected by a modification
//! check for a looser or tighter reason.

/// Default tolerance for "sums to one", "balances to zero" and "is a no-op".
///
/// Used by [`crate::Partition::new`], by modification builders for the
/// triviality and balance checks, and by the applier as the default removal
/// sanity tolerance.
pub const DEFAULT_EPSILON: f64 = 1e-8;

/// Weights with a magnitude below this are treated as zero by the
/// normalising partition factories and dropped from the result.
pub const ZERO_WEIGHT_THRESHOLD: f64 = 1e-12;

/// Largest overshoot past 0 or 1 that [`crate::UnitFraction`] arithmetic
/// absorbs as rounding noise by clamping to the bound.
pub const ROUNDING_SLACK: f64 = 1e-12;

/// Optional tolerance overrides carried by a modification and consumed by the
/// applier.
///
/// Both default to `None`, meaning [`DEFAULT_EPSILON`] applies.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModificationTolerances {
    /// Tolerance for matching a removal's recorded weight against the
    /// partition's actual weight at apply time.
    pub removal_epsilon: Option<f64>,

    /// Declared net-addition tolerance.
    ///
    /// Presence is an opt-in: the build-time balance check widens to this
    /// value and the applier renormalises its result instead of strictly
    /// re-validating the sum.
    pub net_addition_epsilon: Option<f64>,
}

impl ModificationTolerances {
    /// Effective removal tolerance.
    pub fn removal_epsilon(&self) -> f64 {
        self.removal_epsilon.unwrap_or(DEFAULT_EPSILON)
    }

    /// Tolerance used when checking that additions and subtractions balance.
    pub fn balance_epsilon(&self) -> f64 {
        self.net_addition_epsilon.unwrap_or(DEFAULT_EPSILON)
    }

    /// Whether the applier should renormalise rather than strictly validate.
    pub fn renormalizes(&self) -> bool {
        self.net_addition_epsilon.is_some()
    }

    /// Reject overrides that are negative, non-finite or not below one.
    pub(crate) fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("removal_epsilon", self.removal_epsilon),
            ("net_addition_epsilon", self.net_addition_epsilon),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..1.0).contains(&v) {
                    return Err(crate::PartitionError::InvalidTolerance { name, value: v });
                }
            }
        }
        Ok(())
    }
}
