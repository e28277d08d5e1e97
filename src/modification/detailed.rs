/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Four-category modification: the caller states up front which keys are new,
//! which grow, which disappear and which shrink.

use alloc::vec::Vec;

use hashbrown::HashMap;

use super::{require, validate_categories, ModificationCategory, PartitionModification};
use crate::error::Result;
use crate::fraction::UnitFraction;
use crate::partition::{Partition, PartitionKey};
use crate::tolerance::ModificationTolerances;

/// A validated diff against a partition.
///
/// - `to_add`: keys that must be absent; value is the new fraction.
/// - `to_increase`: keys that must be present; value is the amount added.
/// - `to_remove`: keys that must be present; value is the weight the key is
///   expected to hold, checked by the applier against stale snapshots.
/// - `to_decrease`: keys that must be present; value is the amount subtracted.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailedPartitionModification<K: PartitionKey> {
    to_add: HashMap<K, UnitFraction>,
    to_increase: HashMap<K, UnitFraction>,
    to_remove: HashMap<K, UnitFraction>,
    to_decrease: HashMap<K, UnitFraction>,
    tolerances: ModificationTolerances,
}

impl<K: PartitionKey> DetailedPartitionModification<K> {
    /// Start staging a modification.
    pub fn builder() -> DetailedPartitionModificationBuilder<K> {
        DetailedPartitionModificationBuilder::new()
    }

    /// Validating constructor taking every category at once, with default
    /// tolerances.
    pub fn new(
        to_add: HashMap<K, UnitFraction>,
        to_increase: HashMap<K, UnitFraction>,
        to_remove: HashMap<K, UnitFraction>,
        to_decrease: HashMap<K, UnitFraction>,
    ) -> Result<Self> {
        Self::builder()
            .keys_to_add(to_add)
            .keys_to_increase(to_increase)
            .keys_to_remove(to_remove)
            .keys_to_decrease(to_decrease)
            .build()
    }

    /// The modification that changes nothing.
    pub fn empty() -> Self {
        Self {
            to_add: HashMap::new(),
            to_increase: HashMap::new(),
            to_remove: HashMap::new(),
            to_decrease: HashMap::new(),
            tolerances: ModificationTolerances::default(),
        }
    }

    /// Keys to add with their new fractions.
    pub fn to_add(&self) -> &HashMap<K, UnitFraction> {
        &self.to_add
    }

    /// Keys to increase with the amount to add.
    pub fn to_increase(&self) -> &HashMap<K, UnitFraction> {
        &self.to_increase
    }

    /// Keys to remove with the weight they are expected to hold.
    pub fn to_remove(&self) -> &HashMap<K, UnitFraction> {
        &self.to_remove
    }

    /// Keys to decrease with the amount to subtract.
    pub fn to_decrease(&self) -> &HashMap<K, UnitFraction> {
        &self.to_decrease
    }

    /// Total weight moved (additions, equal to subtractions within tolerance).
    pub fn additive_total(&self) -> f64 {
        UnitFraction::total(self.to_add.values().chain(self.to_increase.values()).copied())
    }
}

impl<K: PartitionKey> PartitionModification<K> for DetailedPartitionModification<K> {
    fn apply_to(&self, partition: &Partition<K>) -> Result<Partition<K>> {
        crate::applier::apply_detailed(partition, self)
    }

    fn is_empty(&self) -> bool {
        self.to_add.is_empty()
            && self.to_increase.is_empty()
            && self.to_remove.is_empty()
            && self.to_decrease.is_empty()
    }

    fn tolerances(&self) -> ModificationTolerances {
        self.tolerances
    }

    fn touched_keys(&self) -> Vec<&K> {
        self.to_add
            .keys()
            .chain(self.to_increase.keys())
            .chain(self.to_remove.keys())
            .chain(self.to_decrease.keys())
            .collect()
    }
}

// ─── Builder ────────────────────────────────────────────────────────────────

/// Stages the four categories of a [`DetailedPartitionModification`].
///
/// Every category must be set, even if empty (use the `no_keys_to_*`
/// helpers); setting a category again replaces the earlier value.
#[derive(Clone, Debug)]
pub struct DetailedPartitionModificationBuilder<K: PartitionKey> {
    to_add: Option<HashMap<K, UnitFraction>>,
    to_increase: Option<HashMap<K, UnitFraction>>,
    to_remove: Option<HashMap<K, UnitFraction>>,
    to_decrease: Option<HashMap<K, UnitFraction>>,
    tolerances: ModificationTolerances,
}

impl<K: PartitionKey> DetailedPartitionModificationBuilder<K> {
    /// A builder with nothing configured.
    pub fn new() -> Self {
        Self {
            to_add: None,
            to_increase: None,
            to_remove: None,
            to_decrease: None,
            tolerances: ModificationTolerances::default(),
        }
    }

    /// Keys that must not yet be in the partition, with their fractions.
    pub fn keys_to_add(mut self, entries: HashMap<K, UnitFraction>) -> Self {
        self.to_add = Some(entries);
        self
    }

    /// Keys already in the partition, with the amount each gains.
    pub fn keys_to_increase(mut self, entries: HashMap<K, UnitFraction>) -> Self {
        self.to_increase = Some(entries);
        self
    }

    /// Keys already in the partition, with the weight each currently holds.
    pub fn keys_to_remove(mut self, entries: HashMap<K, UnitFraction>) -> Self {
        self.to_remove = Some(entries);
        self
    }

    /// Keys already in the partition, with the amount each loses.
    pub fn keys_to_decrease(mut self, entries: HashMap<K, UnitFraction>) -> Self {
        self.to_decrease = Some(entries);
        self
    }

    /// Nothing to add.
    pub fn no_keys_to_add(self) -> Self {
        self.keys_to_add(HashMap::new())
    }

    /// Nothing to increase.
    pub fn no_keys_to_increase(self) -> Self {
        self.keys_to_increase(HashMap::new())
    }

    /// Nothing to remove.
    pub fn no_keys_to_remove(self) -> Self {
        self.keys_to_remove(HashMap::new())
    }

    /// Nothing to decrease.
    pub fn no_keys_to_decrease(self) -> Self {
        self.keys_to_decrease(HashMap::new())
    }

    /// Override the tolerance for matching removal weights at apply time.
    pub fn removal_epsilon(mut self, epsilon: f64) -> Self {
        self.tolerances.removal_epsilon = Some(epsilon);
        self
    }

    /// Declare a net-addition tolerance: widens the balance check to
    /// `epsilon` and makes the applier renormalise its result.
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
    pub fn build(self) -> Result<DetailedPartitionModification<K>> {
        let to_add = require(self.to_add, ModificationCategory::Add)?;
        let to_increase = require(self.to_increase, ModificationCategory::Increase)?;
        let to_remove = require(self.to_remove, ModificationCategory::Remove)?;
        let to_decrease = require(self.to_decrease, ModificationCategory::Decrease)?;

        validate_categories(
            &[
                (ModificationCategory::Add, &to_add),
                (ModificationCategory::Increase, &to_increase),
                (ModificationCategory::Remove, &to_remove),
                (ModificationCategory::Decrease, &to_decrease),
            ],
            &self.tolerances,
        )?;

        Ok(DetailedPartitionModification {
            to_add,
            to_increase,
            to_remove,
            to_decrease,
            tolerances: self.tolerances,
        })
    }
}

impl<K: PartitionKey> Default for DetailedPartitionModificationBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
