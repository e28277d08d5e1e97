/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Normalised, non-negative weight distributions over an arbitrary key set.
//!
//! A [`Partition`] is a point on the probability simplex: every key carries a
//! strictly positive [`UnitFraction`] and the fractions sum to one within
//! [`DEFAULT_EPSILON`]. Both properties are checked once, in the factories,
//! and never again: there is no way to mutate a partition after it exists.
//!
//! # Implementing a key type
//!
//! ```rust,ignore
//! use simplex_edit::Partition;
//!
//! #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
//! enum Asset { Bonds, Equity, Cash }
//!
//! // Any Eq + Hash + Clone + Debug type is a PartitionKey.
//! let p = Partition::from_weights([(Asset::Bonds, 3.0), (Asset::Equity, 1.0)].into_iter().collect())?;
//! assert_eq!(p.get_or_zero(&Asset::Cash).value(), 0.0);
//! ```

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::hash::Hash;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::error::{key_label, PartitionError, Result};
use crate::fraction::UnitFraction;
use crate::signed::SignedPartition;
use crate::tolerance::{DEFAULT_EPSILON, ZERO_WEIGHT_THRESHOLD};

// ─── PartitionKey ───────────────────────────────────────────────────────────

/// Capability required of partition keys: value equality, hashing, cloning
/// and a `Debug` rendering for error messages.
///
/// Blanket-implemented; there is nothing to implement by hand.
pub trait PartitionKey: Eq + Hash + Clone + fmt::Debug {}

impl<T: Eq + Hash + Clone + fmt::Debug> PartitionKey for T {}

// ─── Partition ──────────────────────────────────────────────────────────────

/// Immutable mapping from keys to positive fractions that sum to one.
#[derive(Clone, Debug, PartialEq)]
pub struct Partition<K: PartitionKey> {
    fractions: HashMap<K, UnitFraction>,
}

impl<K: PartitionKey> Partition<K> {
    // ── Factories ──────────────────────────────────────────────────────────

    /// Strict factory.
    ///
    /// Fails if any fraction is zero or if the fractions do not sum to one
    /// within [`DEFAULT_EPSILON`]. An empty map sums to zero and is rejected.
    pub fn new(fractions: HashMap<K, UnitFraction>) -> Result<Self> {
        if let Some((key, _)) = fractions.iter().find(|(_, f)| f.is_zero()) {
            return Err(PartitionError::ZeroEntry { key: key_label(key) });
        }
        let sum = UnitFraction::total(fractions.values().copied());
        if (sum - 1.0).abs() > DEFAULT_EPSILON {
            return Err(PartitionError::SumNotOne {
                sum,
                epsilon: DEFAULT_EPSILON,
            });
        }
        Ok(Self { fractions })
    }

    /// Strict factory from `(key, fraction)` pairs. A repeated key fails
    /// instead of silently overwriting the earlier entry.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, UnitFraction)>,
    {
        let mut fractions = HashMap::new();
        for (key, fraction) in pairs {
            match fractions.entry(key) {
                Entry::Occupied(e) => {
                    return Err(PartitionError::DuplicateKey {
                        key: key_label(e.key()),
                    })
                }
                Entry::Vacant(e) => {
                    e.insert(fraction);
                }
            }
        }
        Self::new(fractions)
    }

    /// The partition that gives everything to `key`.
    pub fn single(key: K) -> Self {
        let mut fractions = HashMap::with_capacity(1);
        fractions.insert(key, UnitFraction::ONE);
        Self { fractions }
    }

    /// Normalising factory: rescales arbitrary non-negative weights to sum to
    /// one.
    ///
    /// Weights are first divided by the largest one in `f64`, so any finite
    /// input fits [`Decimal`]'s range; totals and quotients are then computed
    /// in [`Decimal`] to keep the rescaled sum as close to one as `f64`
    /// allows. Weights with magnitude below [`ZERO_WEIGHT_THRESHOLD`] are
    /// dropped; any other negative weight fails.
    pub fn from_weights(weights: HashMap<K, f64>) -> Result<Self> {
        let count = weights.len();
        let mut positive: Vec<(K, f64)> = Vec::with_capacity(count);
        let mut largest = 0.0_f64;

        for (key, weight) in weights {
            if !weight.is_finite() {
                return Err(PartitionError::NonFiniteWeight {
                    key: key_label(&key),
                    weight,
                });
            }
            if weight.abs() < ZERO_WEIGHT_THRESHOLD {
                continue;
            }
            if weight < 0.0 {
                return Err(PartitionError::NegativeWeight {
                    key: key_label(&key),
                    weight,
                });
            }
            largest = largest.max(weight);
            positive.push((key, weight));
        }

        if positive.is_empty() {
            return Err(PartitionError::NoPositiveWeight { count });
        }

        // Every scaled weight lies in (0, 1]; ones that underflow to zero are
        // negligible next to the largest.
        let kept: Vec<(K, Decimal)> = positive
            .into_iter()
            .filter_map(|(key, weight)| {
                Decimal::from_f64(weight / largest)
                    .filter(|d| !d.is_zero())
                    .map(|d| (key, d))
            })
            .collect();
        let total: Decimal = kept.iter().map(|(_, d)| *d).sum();

        let mut fractions = HashMap::with_capacity(kept.len());
        for (key, weight) in kept {
            let share = weight
                .checked_div(total)
                .and_then(|s| s.to_f64())
                .unwrap_or(0.0);
            // Shares too small to survive the division are zero weight too.
            if share <= 0.0 {
                continue;
            }
            fractions.insert(key, UnitFraction::new(share.min(1.0))?);
        }
        Self::new(fractions)
    }

    /// Normalising factory for a partial allocation whose fractions sum to at
    /// most one. Fails with [`PartitionError::SumNotOne`] if the input sums
    /// above `1 + DEFAULT_EPSILON`.
    pub fn from_fractions_which_may_sum_to_below_one(
        fractions: HashMap<K, UnitFraction>,
    ) -> Result<Self> {
        let sum = UnitFraction::total(fractions.values().copied());
        if sum > 1.0 + DEFAULT_EPSILON {
            return Err(PartitionError::SumNotOne {
                sum,
                epsilon: DEFAULT_EPSILON,
            });
        }
        Self::from_weights(fractions.into_iter().map(|(k, f)| (k, f.value())).collect())
    }

    // ── Read accessors ─────────────────────────────────────────────────────

    /// Fraction held by `key`, or an error if the key is absent.
    pub fn fraction(&self, key: &K) -> Result<UnitFraction> {
        self.get(key)
            .ok_or_else(|| PartitionError::KeyNotFound { key: key_label(key) })
    }

    /// Fraction held by `key`, if present.
    pub fn get(&self, key: &K) -> Option<UnitFraction> {
        self.fractions.get(key).copied()
    }

    /// Fraction held by `key`, or zero if absent. Absent keys are never stored
    /// as zero; this is a read-time convenience only.
    pub fn get_or_zero(&self, key: &K) -> UnitFraction {
        self.get(key).unwrap_or(UnitFraction::ZERO)
    }

    /// Whether `key` holds a share.
    pub fn contains_key(&self, key: &K) -> bool {
        self.fractions.contains_key(key)
    }

    /// Number of keys with a share.
    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    /// Always `false` for a validly constructed partition; provided for API
    /// symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    /// Keys, in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.fractions.keys()
    }

    /// `(key, fraction)` pairs, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, UnitFraction)> {
        self.fractions.iter().map(|(k, f)| (k, *f))
    }

    /// Sum of all fractions (one, within [`DEFAULT_EPSILON`]).
    pub fn total(&self) -> f64 {
        UnitFraction::total(self.fractions.values().copied())
    }

    /// Per-key comparison within `epsilon`. Key sets must match exactly.
    pub fn almost_equals(&self, other: &Self, epsilon: f64) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, f)| {
                other
                    .get(k)
                    .is_some_and(|g| f.almost_equals(g, epsilon))
            })
    }

    /// Widen into a representation whose weights may leave `[0, 1]`.
    pub fn to_signed_partition(&self) -> SignedPartition<K> {
        SignedPartition::from_map(
            self.fractions
                .iter()
                .map(|(k, f)| (k.clone(), f.value()))
                .collect(),
        )
    }

    // ── Canonical orderings ────────────────────────────────────────────────

    /// Entries by descending weight; equal weights are ordered by `cmp`.
    pub fn entries_by_descending_weight_by<F>(&self, mut cmp: F) -> Vec<(&K, UnitFraction)>
    where
        F: FnMut(&K, &K) -> Ordering,
    {
        let mut entries: Vec<(&K, UnitFraction)> = self.iter().collect();
        entries.sort_by(|a, b| {
            b.1.value()
                .total_cmp(&a.1.value())
                .then_with(|| cmp(a.0, b.0))
        });
        entries
    }

    /// Entries in ascending key order.
    pub fn entries_by_key(&self) -> Vec<(&K, UnitFraction)>
    where
        K: Ord,
    {
        let mut entries: Vec<(&K, UnitFraction)> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }

    /// Render as `{key=pct, ...}` by descending weight, ties ordered by `cmp`.
    pub fn display_by_descending_weight_by<F>(&self, cmp: F) -> String
    where
        K: fmt::Display,
        F: FnMut(&K, &K) -> Ordering,
    {
        render(&self.entries_by_descending_weight_by(cmp))
    }

    /// Render as `{key=pct, ...}` in ascending key order.
    pub fn display_by_key(&self) -> String
    where
        K: fmt::Display + Ord,
    {
        render(&self.entries_by_key())
    }

    pub(crate) fn as_map(&self) -> &HashMap<K, UnitFraction> {
        &self.fractions
    }
}

fn render<K: fmt::Display>(entries: &[(&K, UnitFraction)]) -> String {
    use core::fmt::Write;

    let mut out = String::from("{");
    for (i, (key, fraction)) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        // Writing into a String cannot fail.
        let _ = write!(out, "{}={}", key, fraction);
    }
    out.push('}');
    out
}

/// Descending weight, ties broken by key order.
impl<K: PartitionKey + fmt::Display + Ord> fmt::Display for Partition<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_by_descending_weight_by(K::cmp))
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use alloc::string::ToString;

    // ── Helpers ──────────────────────────────────────────────────────────

    fn uf(v: f64) -> UnitFraction {
        UnitFraction::new(v).unwrap()
    }

    fn fractions(entries: &[(&'static str, f64)]) -> HashMap<&'static str, UnitFraction> {
        entries.iter().map(|&(k, v)| (k, uf(v))).collect()
    }

    fn weights(entries: &[(&'static str, f64)]) -> HashMap<&'static str, f64> {
        entries.iter().copied().collect()
    }

    // ── Strict factory ───────────────────────────────────────────────────

    #[test]
    fn test_strict_factory_accepts_valid_partition() {
        let p = Partition::new(fractions(&[("A", 0.5), ("B", 0.3), ("C", 0.2)])).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.total() - 1.0).abs() < 1e-12);
        assert_eq!(p.fraction(&"B").unwrap(), uf(0.3));
    }

    #[test]
    fn test_strict_factory_rejects_zero_entry() {
        let err = Partition::new(fractions(&[("A", 1.0), ("B", 0.0)])).unwrap_err();
        assert_eq!(err, PartitionError::ZeroEntry { key: key_label(&"B") });
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_strict_factory_rejects_bad_sum() {
        let err = Partition::new(fractions(&[("A", 0.5), ("B", 0.4)])).unwrap_err();
        assert!(matches!(err, PartitionError::SumNotOne { .. }), "{:?}", err);

        let err = Partition::<&str>::new(HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_strict_factory_tolerates_tiny_drift() {
        assert!(Partition::new(fractions(&[("A", 0.5 + 5e-9), ("B", 0.5)])).is_ok());
        assert!(Partition::new(fractions(&[("A", 0.5 + 5e-8), ("B", 0.5)])).is_err());
    }

    #[test]
    fn test_from_pairs_rejects_duplicates() {
        let err = Partition::from_pairs([("A", uf(0.5)), ("A", uf(0.5))]).unwrap_err();
        assert_eq!(err, PartitionError::DuplicateKey { key: key_label(&"A") });
    }

    #[test]
    fn test_single() {
        let p = Partition::single("A");
        assert_eq!(p.get(&"A"), Some(UnitFraction::ONE));
        assert_eq!(p.len(), 1);
    }

    // ── Normalising factories ────────────────────────────────────────────

    #[test]
    fn test_from_weights_normalises() {
        let p = Partition::from_weights(weights(&[("A", 3.0), ("B", 1.0)])).unwrap();
        assert!((p.get_or_zero(&"A").value() - 0.75).abs() < 1e-15);
        assert!((p.get_or_zero(&"B").value() - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_from_weights_normalises_weights_beyond_decimal_range() {
        let p = Partition::from_weights(weights(&[("A", 1e30), ("B", 3e30)])).unwrap();
        assert!((p.get_or_zero(&"A").value() - 0.25).abs() < 1e-15);
        assert!((p.get_or_zero(&"B").value() - 0.75).abs() < 1e-15);

        // Each weight fits, their total would not.
        let p = Partition::from_weights(weights(&[("A", 5e28), ("B", 5e28)])).unwrap();
        assert!((p.get_or_zero(&"A").value() - 0.5).abs() < 1e-15);
        assert!((p.total() - 1.0).abs() < 1e-15);

        let p = Partition::from_weights(weights(&[("A", f64::MAX), ("B", 1.0)])).unwrap();
        assert_eq!(p.len(), 1);
        assert_eq!(p.get_or_zero(&"A"), UnitFraction::ONE);
    }

    #[test]
    fn test_from_weights_thirds_sum_to_one() {
        let p = Partition::from_weights(weights(&[("A", 1.0), ("B", 1.0), ("C", 1.0)])).unwrap();
        assert!((p.total() - 1.0).abs() < 1e-15, "total={}", p.total());
    }

    #[test]
    fn test_from_weights_drops_negligible_weights() {
        let p = Partition::from_weights(weights(&[("A", 2.0), ("B", 1e-13), ("C", -1e-13)])).unwrap();
        assert_eq!(p.len(), 1);
        assert!(!p.contains_key(&"B"));
        assert!(!p.contains_key(&"C"));
    }

    #[test]
    fn test_from_weights_rejects_negative_and_non_finite() {
        let err = Partition::from_weights(weights(&[("A", 1.0), ("B", -0.5)])).unwrap_err();
        assert!(matches!(err, PartitionError::NegativeWeight { .. }), "{:?}", err);

        let err = Partition::from_weights(weights(&[("A", f64::NAN)])).unwrap_err();
        assert!(matches!(err, PartitionError::NonFiniteWeight { .. }), "{:?}", err);
    }

    #[test]
    fn test_from_weights_rejects_all_zero() {
        let err = Partition::from_weights(weights(&[("A", 0.0), ("B", 1e-14)])).unwrap_err();
        assert_eq!(err, PartitionError::NoPositiveWeight { count: 2 });
    }

    #[test]
    fn test_partial_allocation_is_rescaled() {
        let p = Partition::from_fractions_which_may_sum_to_below_one(fractions(&[
            ("A", 0.2),
            ("B", 0.2),
        ]))
        .unwrap();
        assert!((p.get_or_zero(&"A").value() - 0.5).abs() < 1e-15);

        let err = Partition::from_fractions_which_may_sum_to_below_one(fractions(&[
            ("A", 0.7),
            ("B", 0.7),
        ]))
        .unwrap_err();
        assert!(matches!(err, PartitionError::SumNotOne { .. }), "{:?}", err);
    }

    // ── Accessors ────────────────────────────────────────────────────────

    #[test]
    fn test_lookup_of_absent_key() {
        let p = Partition::single("A");
        assert_eq!(p.get_or_zero(&"Z"), UnitFraction::ZERO);
        assert!(!p.contains_key(&"Z"));
        let err = p.fraction(&"Z").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }

    #[test]
    fn test_almost_equals() {
        let a = Partition::new(fractions(&[("A", 0.5), ("B", 0.5)])).unwrap();
        let b = Partition::new(fractions(&[("A", 0.5 + 1e-9), ("B", 0.5)])).unwrap();
        let c = Partition::new(fractions(&[("A", 0.5), ("C", 0.5)])).unwrap();
        assert!(a.almost_equals(&b, 1e-8));
        assert!(!a.almost_equals(&c, 1e-8));
    }

    #[test]
    fn test_signed_widening_is_lossless() {
        let p = Partition::new(fractions(&[("A", 0.25), ("B", 0.75)])).unwrap();
        let s = p.to_signed_partition();
        assert_eq!(s.get_or_zero(&"A"), 0.25);
        assert_eq!(s.get_or_zero(&"B"), 0.75);
        assert_eq!(s.len(), 2);
    }

    // ── Ordering and display ─────────────────────────────────────────────

    #[test]
    fn test_descending_weight_order_with_tie_breaker() {
        let p = Partition::new(fractions(&[("B", 0.25), ("A", 0.25), ("C", 0.5)])).unwrap();
        let keys: Vec<&str> = p
            .entries_by_descending_weight_by(|a, b| a.cmp(b))
            .into_iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(keys, ["C", "A", "B"]);

        let reversed: Vec<&str> = p
            .entries_by_descending_weight_by(|a, b| b.cmp(a))
            .into_iter()
            .map(|(k, _)| *k)
            .collect();
        assert_eq!(reversed, ["C", "B", "A"]);
    }

    #[test]
    fn test_display_is_deterministic() {
        let p = Partition::new(fractions(&[("B", 0.25), ("A", 0.25), ("C", 0.5)])).unwrap();
        assert_eq!(p.to_string(), "{C=50.00%, A=25.00%, B=25.00%}");
        assert_eq!(p.display_by_key(), "{A=25.00%, B=25.00%, C=50.00%}");
    }
}
