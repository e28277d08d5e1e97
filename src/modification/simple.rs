/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Two-category modification: whether a key is new or existing is left to the
//! applier, which probes the target partition.

use alloc::vec::Vec;

use hashbrown::HashMap;

use super::{require, validate_categories, ModificationCategory, PartitionModification};
use crate::error::Result;
use crate::fraction::UnitFraction;
use crate::partition::{Partition, PartitionKey};
use crate::tolerance::ModificationTolerances;

/// A validated diff that does not commit to which keys already exist.
///
/// An entry in `to_remove_or_decrease` whose value matches the key's current
/// weight (within the removal tolerance) removes the key; a smaller value
/// decreases it.
#[derive(Clone, Debug, PartialEq)]
pub struct SimplePartitionModification<K: PartitionKey> {
    to_add_or_increase: HashMap<K, UnitFraction>,
    to_remove_or_decrease: HashMap<K, UnitFraction>,
    tolerances: ModificationTolerances,
}

impl<K: PartitionKey> SimplePartitionModification<K> {
    /// Start staging a modification.
    pub fn builder() -> SimplePartitionModificationBuilder<K> {
        SimplePartitionModificationBuilder::new()
    }

    /// Validating constructor with default tolerances.
    pub fn new(
        to_add_or_increase: HashMap<K, UnitFraction>,
        to_remove_or_decrease: HashMap<K, UnitFraction>,
    ) -> Result<Self> {
        Self::builder()
            .keys_to_add_or_increase(to_add_or_increase)
            .keys_to_remove_or_decrease(to_remove_or_decrease)
            .build()
    }

    /// Move `amount` from `from` to `to`. Fails like any other modification if
    /// `from == to` or `amount` is negligible.
    pub fn transfer(from: K, to: K, amount: UnitFraction) -> Result<Self> {
        let mut gain = HashMap::with_capacity(1);
        gain.insert(to, amount);
        let mut loss = HashMap::with_capacity(1);
        loss.insert(from, amount);
        Self::new(gain, loss)
    }

    /// The modification that changes nothing.
    pub fn empty() -> Self {
        Self {
            to_add_or_increase: HashMap::new(),
            to_remove_or_decrease: HashMap::new(),
            tolerances: ModificationTolerances::default(),
        }
    }

    /// Keys gaining weight.
    pub fn to_add_or_increase(&self) -> &HashMap<K, UnitFraction> {
        &self.to_add_or_increase
    }

    /// Keys losing weight.
    pub fn to_remove_or_decrease(&self) -> &HashMap<K, UnitFraction> {
        &self.to_remove_or_decrease
    }

    /// Total weight moved.
    pub fn additive_total(&self) -> f64 {
        UnitFraction::total(self.to_add_or_increase.values().copied())
    }
}

impl<K: PartitionKey> PartitionModification<K> for SimplePartitionModification<K> {
    fn apply_to(&self, partition: &Partition<K>) -> Result<Partition<K>> {
        crate::applier::apply_simple(partition, self)
    }

    fn is_empty(&self) -> bool {
        self.to_add_or_increase.is_empty() && self.to_remove_or_decrease.is_empty()
    }

    fn tolerances(&self) -> ModificationTolerances {
        self.tolerances
    }

    fn touched_keys(&self) -> Vec<&K> {
        self.to_add_or_increase
            .keys()
            .chain(self.to_remove_or_decrease.keys())
            .collect()
    }
}

// ─── Builder ────────────────────────────────────────────────────────────────

/// Stages the two categories of a [`SimplePartitionModification`].
#[derive(Clone, Debug)]
pub struct SimplePartitionModificationBuilder<K: PartitionKey> {
    to_add_or_increase: Option<HashMap<K, UnitFraction>>,
    to_remove_or_decrease: Option<HashMap<K, UnitFraction>>,
    tolerances: ModificationTolerances,
}

impl<K: PartitionKey> SimplePartitionModificationBuilder<K> {
    /// A builder with nothing configured.
    pub fn new() -> Self {
        Self {
            to_add_or_increase: None,
            to_remove_or_decrease: None,
            tolerances: ModificationTolerances::default(),
        }
    }

    /// Keys gaining weight, new or existing.
    pub fn keys_to_add_or_increase(mut self, entries: HashMap<K, UnitFraction>) -> Self {
        self.to_add_or_increase = Some(entries);
        self
    }

    /// Existing keys losing weight.
    pub fn keys_to_remove_or_decrease(mut self, entries: HashMap<K, UnitFraction>) -> Self {
        self.to_remove_or_decrease = Some(entries);
        self
    }

    /// Nothing gains weight.
    pub fn no_keys_to_add_or_increase(self) -> Self {
        self.keys_to_add_or_increase(HashMap::new())
    }

    /// Nothing loses weight.
    pub fn no_keys_to_remove_or_decrease(self) -> Self {
        self.keys_to_remove_or_decrease(HashMap::new())
    }

    /// Override the tolerance that decides between removal and decrease.
    ///
    /// Values below [`DEFAULT_EPSILON`](crate::DEFAULT_EPSILON) behave as
    /// `DEFAULT_EPSILON`: a decrease leaving that little behind would fail, so
    /// such an entry is always treated as a removal.
    pub fn removal_epsilon(mut self, epsilon: f64) -> Self {
        self.tolerances.removal_epsilon = Some(epsilon);
        self
    }

    /// Declare a net-addition tolerance (see
    /// [`ModificationTolerances::net_addition_epsilon`]).
    pub fn net_addition_epsilon(mut self, epsilon: f64) -> Self {
        self.tolerances.net_addition_epsilon = Some(epsilon);
        self
    }

    /// Replace all tolerance overrides at once.
    pub fn tolerances(mut self, tolerances: ModificationTolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Validate and produce the modification.
    pub fn build(self) -> Result<SimplePartitionModification<K>> {
        let to_add_or_increase =
            require(self.to_add_or_increase, ModificationCategory::AddOrIncrease)?;
        let to_remove_or_decrease =
            require(self.to_remove_or_decrease, ModificationCategory::RemoveOrDecrease)?;

        validate_categories(
            &[
                (ModificationCategory::AddOrIncrease, &to_add_or_increase),
                (ModificationCategory::RemoveOrDecrease, &to_remove_or_decrease),
            ],
            &self.tolerances,
        )?;

        Ok(SimplePartitionModification {
            to_add_or_increase,
            to_remove_or_decrease,
            tolerances: self.tolerances,
        })
    }
}

impl<K: PartitionKey> Default for SimplePartitionModificationBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn uf(v: f64) -> UnitFraction {
        UnitFraction::new(v).unwrap()
    }

    #[test]
    fn test_transfer_builds_two_entries() {
        let m = SimplePartitionModification::transfer("A", "B", uf(0.25)).unwrap();
        assert_eq!(m.to_add_or_increase().get(&"B"), Some(&uf(0.25)));
        assert_eq!(m.to_remove_or_decrease().get(&"A"), Some(&uf(0.25)));
        assert!((m.additive_total() - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_transfer_to_self_overlaps() {
        let err = SimplePartitionModification::transfer("A", "A", uf(0.25)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Overlap);
    }

    #[test]
    fn test_unset_category_is_configuration_error() {
        let err = SimplePartitionModification::<&str>::builder()
            .no_keys_to_remove_or_decrease()
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_trivial_and_unbalanced() {
        let err = SimplePartitionModification::transfer("A", "B", uf(1e-9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TrivialEntry);

        let mut gain = HashMap::new();
        gain.insert("B", uf(0.3));
        let err = SimplePartitionModification::new(gain, HashMap::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Balance);
    }

    #[test]
    fn test_empty() {
        let m = SimplePartitionModification::<&str>::builder()
            .no_keys_to_add_or_increase()
            .no_keys_to_remove_or_decrease()
            .build()
            .unwrap();
        assert!(m.is_empty());
        assert_eq!(m, SimplePartitionModification::empty());
    }
}
