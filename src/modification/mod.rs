/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Validated, balanced edits to a [`Partition`].
//!
//! Two flavours describe the same kind of change:
//!
//! - [`DetailedPartitionModification`]: four categories (add, increase,
//!   remove, decrease); the caller states whether each key is new or existing.
//! - [`SimplePartitionModification`]: two categories (add-or-increase,
//!   remove-or-decrease); the applier decides by probing the partition.
//!
//! Both are only obtainable through a builder or validating constructor that
//! checks, in order: every category configured, categories disjoint, no
//! entry within [`DEFAULT_EPSILON`] of zero, additions balancing subtractions,
//! and the additive total not exceeding the whole partition.

pub mod detailed;
pub mod simple;

pub use detailed::{DetailedPartitionModification, DetailedPartitionModificationBuilder};
pub use simple::{SimplePartitionModification, SimplePartitionModificationBuilder};

use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;

use crate::error::{key_label, PartitionError, Result};
use crate::fraction::UnitFraction;
use crate::partition::{Partition, PartitionKey};
use crate::tolerance::{ModificationTolerances, DEFAULT_EPSILON};

// ─── ModificationCategory ───────────────────────────────────────────────────

/// The kinds of entry a modification can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModificationCategory {
    /// New key; value is its fraction.
    Add,
    /// Existing key; value is the amount to add.
    Increase,
    /// Existing key; value is the weight it is expected to hold now.
    Remove,
    /// Existing key; value is the amount to subtract.
    Decrease,
    /// New or existing key; value is the amount to add.
    AddOrIncrease,
    /// Existing key; value is the amount to subtract, or its full weight.
    RemoveOrDecrease,
}

impl ModificationCategory {
    /// Field-style name used in messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "to_add",
            Self::Increase => "to_increase",
            Self::Remove => "to_remove",
            Self::Decrease => "to_decrease",
            Self::AddOrIncrease => "to_add_or_increase",
            Self::RemoveOrDecrease => "to_remove_or_decrease",
        }
    }

    /// Whether entries in this category add weight.
    pub fn is_additive(self) -> bool {
        matches!(self, Self::Add | Self::Increase | Self::AddOrIncrease)
    }
}

impl fmt::Display for ModificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── PartitionModification ──────────────────────────────────────────────────

/// Behaviour shared by both modification flavours.
pub trait PartitionModification<K: PartitionKey> {
    /// Apply to `partition`, producing a new partition.
    fn apply_to(&self, partition: &Partition<K>) -> Result<Partition<K>>;

    /// Whether every category is empty (applying is the identity).
    fn is_empty(&self) -> bool;

    /// Tolerance overrides carried for the applier.
    fn tolerances(&self) -> ModificationTolerances;

    /// Every key mentioned by any category, in unspecified order.
    fn touched_keys(&self) -> Vec<&K>;
}

// ─── Shared validation ──────────────────────────────────────────────────────

/// A category together with its entries.
pub(crate) type CategoryEntries<'a, K> = (ModificationCategory, &'a HashMap<K, UnitFraction>);

/// Whole-object checks shared by both builders. Runs disjointness,
/// triviality, balance and range checks in that order.
pub(crate) fn validate_categories<K: PartitionKey>(
    categories: &[CategoryEntries<'_, K>],
    tolerances: &ModificationTolerances,
) -> Result<()> {
    tolerances.validate()?;

    let mut seen: HashMap<&K, ModificationCategory> = HashMap::new();
    for &(category, entries) in categories {
        for key in entries.keys() {
            if let Some(first) = seen.insert(key, category) {
                return Err(PartitionError::OverlappingKey {
                    key: key_label(key),
                    first,
                    second: category,
                });
            }
        }
    }

    for &(category, entries) in categories {
        if let Some((key, value)) = entries
            .iter()
            .find(|(_, v)| v.is_almost_zero(DEFAULT_EPSILON))
        {
            return Err(PartitionError::TrivialEntry {
                key: key_label(key),
                category,
                value: value.value(),
            });
        }
    }

    let (mut additive, mut subtractive) = (0.0_f64, 0.0_f64);
    for &(category, entries) in categories {
        let total = UnitFraction::total(entries.values().copied());
        if category.is_additive() {
            additive += total;
        } else {
            subtractive += total;
        }
    }

    let epsilon = tolerances.balance_epsilon();
    if (additive - subtractive).abs() > epsilon {
        return Err(PartitionError::Unbalanced {
            additive,
            subtractive,
            epsilon,
        });
    }
    // Float noise from summing many entries may nudge an exact 1 past 1.
    if additive > 1.0 + DEFAULT_EPSILON {
        return Err(PartitionError::AdditiveTotalOutOfRange { total: additive });
    }
    Ok(())
}

/// Take a staged category out of a builder, or report it unset.
pub(crate) fn require<K>(
    staged: Option<HashMap<K, UnitFraction>>,
    category: ModificationCategory,
) -> Result<HashMap<K, UnitFraction>> {
    staged.ok_or(PartitionError::Unconfigured { category })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_and_direction() {
        assert_eq!(ModificationCategory::Remove.name(), "to_remove");
        assert!(ModificationCategory::AddOrIncrease.is_additive());
        assert!(!ModificationCategory::RemoveOrDecrease.is_additive());
        assert!(!ModificationCategory::Decrease.is_additive());
    }

    #[test]
    fn test_require_reports_unset_category() {
        let err = require::<u8>(None, ModificationCategory::Increase).unwrap_err();
        assert_eq!(
            err,
            PartitionError::Unconfigured {
                category: ModificationCategory::Increase
            }
        );
    }
}
