//! Portable snapshots of partitions and modifications for persistence and
//! transport.
//!
//! Snapshots store plain `(key, f64)` records in a canonical order, so the same
//! partition always serialises to the same bytes regardless of hash iteration
//! order. Restoring runs every record back through the validating factories
//! and builders: a snapshot cannot smuggle in a partition or modification that
//! could not have been built directly.
//!
//! # no_std
//!
//! This module requires the `serde` feature and works with `alloc` only.
//!
//! # Example
//!
//! ```rust,ignore
//! use simplex_edit::snapshot::PartitionSnapshot;
//!
//! let snapshot = PartitionSnapshot::from_partition(&partition);
//! let json = serde_json::to_string(&snapshot).unwrap();
//! let restored = serde_json::from_str::<PartitionSnapshot<String>>(&json)?.restore()?;
//! ```

use alloc::format;
use alloc::vec::Vec;

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;

use crate::error::{key_label, PartitionError, Result};
use crate::fraction::UnitFraction;
use crate::modification::{
    DetailedPartitionModification, ModificationCategory, PartitionModification,
    SimplePartitionModification,
};
use crate::partition::{Partition, PartitionKey};
use crate::tolerance::ModificationTolerances;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// One `(key, fraction)` record.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct EntryRecord<K> {
    /// The key.
    pub key: K,
    /// Its fraction, in `[0, 1]`.
    pub fraction: f64,
}

// ─── PartitionSnapshot ──────────────────────────────────────────────────────

/// Serialisable form of a [`Partition`].
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct PartitionSnapshot<K> {
    /// Format version, always [`SNAPSHOT_VERSION`] for new snapshots.
    pub version: u16,
    /// Entries by descending weight, ties in ascending key order.
    pub entries: Vec<EntryRecord<K>>,
}

impl<K: PartitionKey + Ord> PartitionSnapshot<K> {
    /// Capture `partition`.
    pub fn from_partition(partition: &Partition<K>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            entries: partition
                .entries_by_descending_weight_by(K::cmp)
                .into_iter()
                .map(|(key, fraction)| EntryRecord {
                    key: key.clone(),
                    fraction: fraction.value(),
                })
                .collect(),
        }
    }

    /// Rebuild the partition through the strict factory.
    pub fn restore(&self) -> Result<Partition<K>> {
        check_version(self.version)?;
        Partition::from_pairs(to_pairs(&self.entries)?)
    }
}

// ─── ModificationSnapshot ───────────────────────────────────────────────────

/// Which modification type a [`ModificationSnapshot`] was taken from.
#[derive(serde::Serialize, serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModificationFlavour {
    /// A [`DetailedPartitionModification`].
    Detailed,
    /// A [`SimplePartitionModification`].
    Simple,
}

/// Entries of one modification category.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct CategoryRecord<K> {
    /// The category.
    pub category: ModificationCategory,
    /// Its entries, in ascending key order.
    pub entries: Vec<EntryRecord<K>>,
}

/// Serialisable form of either modification flavour.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct ModificationSnapshot<K> {
    /// Format version, always [`SNAPSHOT_VERSION`] for new snapshots.
    pub version: u16,
    /// Source type.
    pub flavour: ModificationFlavour,
    /// Every category of the source type, empty ones included.
    pub categories: Vec<CategoryRecord<K>>,
    /// Tolerance overrides.
    pub tolerances: ModificationTolerances,
}

impl<K: PartitionKey + Ord> ModificationSnapshot<K> {
    /// Capture a detailed modification.
    pub fn from_detailed(modification: &DetailedPartitionModification<K>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            flavour: ModificationFlavour::Detailed,
            categories: [
                (ModificationCategory::Add, modification.to_add()),
                (ModificationCategory::Increase, modification.to_increase()),
                (ModificationCategory::Remove, modification.to_remove()),
                (ModificationCategory::Decrease, modification.to_decrease()),
            ]
            .into_iter()
            .map(|(category, entries)| category_record(category, entries))
            .collect(),
            tolerances: modification.tolerances(),
        }
    }

    /// Capture a simple modification.
    pub fn from_simple(modification: &SimplePartitionModification<K>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            flavour: ModificationFlavour::Simple,
            categories: [
                (ModificationCategory::AddOrIncrease, modification.to_add_or_increase()),
                (
                    ModificationCategory::RemoveOrDecrease,
                    modification.to_remove_or_decrease(),
                ),
            ]
            .into_iter()
            .map(|(category, entries)| category_record(category, entries))
            .collect(),
            tolerances: modification.tolerances(),
        }
    }

    /// Rebuild a detailed modification through its builder.
    pub fn restore_detailed(&self) -> Result<DetailedPartitionModification<K>> {
        self.check_header(ModificationFlavour::Detailed)?;
        let mut builder = DetailedPartitionModification::builder().tolerances(self.tolerances);
        for record in &self.categories {
            let entries = to_map(&record.entries)?;
            builder = match record.category {
                ModificationCategory::Add => builder.keys_to_add(entries),
                ModificationCategory::Increase => builder.keys_to_increase(entries),
                ModificationCategory::Remove => builder.keys_to_remove(entries),
                ModificationCategory::Decrease => builder.keys_to_decrease(entries),
                other => return Err(foreign_category(other, self.flavour)),
            };
        }
        builder.build()
    }

    /// Rebuild a simple modification through its builder.
    pub fn restore_simple(&self) -> Result<SimplePartitionModification<K>> {
        self.check_header(ModificationFlavour::Simple)?;
        let mut builder = SimplePartitionModification::builder().tolerances(self.tolerances);
        for record in &self.categories {
            let entries = to_map(&record.entries)?;
            builder = match record.category {
                ModificationCategory::AddOrIncrease => builder.keys_to_add_or_increase(entries),
                ModificationCategory::RemoveOrDecrease => {
                    builder.keys_to_remove_or_decrease(entries)
                }
                other => return Err(foreign_category(other, self.flavour)),
            };
        }
        builder.build()
    }

    fn check_header(&self, expected: ModificationFlavour) -> Result<()> {
        check_version(self.version)?;
        if self.flavour != expected {
            return Err(PartitionError::InvalidSnapshot {
                detail: format!("snapshot holds a {:?} modification, not {:?}", self.flavour, expected),
            });
        }
        for (i, record) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|r| r.category == record.category) {
                return Err(PartitionError::InvalidSnapshot {
                    detail: format!("category {} is listed more than once", record.category),
                });
            }
        }
        Ok(())
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn check_version(version: u16) -> Result<()> {
    if version != SNAPSHOT_VERSION {
        return Err(PartitionError::InvalidSnapshot {
            detail: format!("unsupported version {} (expected {})", version, SNAPSHOT_VERSION),
        });
    }
    Ok(())
}

fn foreign_category(category: ModificationCategory, flavour: ModificationFlavour) -> PartitionError {
    PartitionError::InvalidSnapshot {
        detail: format!("category {} does not belong to a {:?} modification", category, flavour),
    }
}

fn category_record<K: PartitionKey + Ord>(
    category: ModificationCategory,
    entries: &HashMap<K, UnitFraction>,
) -> CategoryRecord<K> {
    let mut records: Vec<EntryRecord<K>> = entries
        .iter()
        .map(|(key, fraction)| EntryRecord {
            key: key.clone(),
            fraction: fraction.value(),
        })
        .collect();
    records.sort_by(|a, b| a.key.cmp(&b.key));
    CategoryRecord {
        category,
        entries: records,
    }
}

fn to_pairs<K: Clone>(records: &[EntryRecord<K>]) -> Result<Vec<(K, UnitFraction)>> {
    records
        .iter()
        .map(|r| Ok((r.key.clone(), UnitFraction::new(r.fraction)?)))
        .collect()
}

fn to_map<K: PartitionKey>(records: &[EntryRecord<K>]) -> Result<HashMap<K, UnitFraction>> {
    let mut map = HashMap::with_capacity(records.len());
    for (key, fraction) in to_pairs(records)? {
        match map.entry(key) {
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
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn uf(v: f64) -> UnitFraction {
        UnitFraction::new(v).unwrap()
    }

    #[test]
    fn test_partition_snapshot_is_canonical() {
        let p = Partition::from_pairs([("B", uf(0.25)), ("C", uf(0.5)), ("A", uf(0.25))]).unwrap();
        let snap = PartitionSnapshot::from_partition(&p);
        let keys: Vec<&str> = snap.entries.iter().map(|e| e.key).collect();
        assert_eq!(keys, ["C", "A", "B"]);
        assert_eq!(snap.restore().unwrap(), p);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut snap = PartitionSnapshot::from_partition(&Partition::single("A"));
        snap.version = 99;
        let err = snap.restore().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Construction);
    }

    #[test]
    fn test_flavour_mismatch_rejected() {
        let m = SimplePartitionModification::transfer("A", "B", uf(0.1)).unwrap();
        let snap = ModificationSnapshot::from_simple(&m);
        assert!(matches!(
            snap.restore_detailed().unwrap_err(),
            PartitionError::InvalidSnapshot { .. }
        ));
        assert_eq!(snap.restore_simple().unwrap(), m);
    }

    #[test]
    fn test_repeated_category_rejected() {
        let m = SimplePartitionModification::transfer("A", "B", uf(0.1)).unwrap();
        let mut snap = ModificationSnapshot::from_simple(&m);
        let again = snap.categories[0].clone();
        snap.categories.push(again);
        let err = snap.restore_simple().unwrap_err();
        assert!(matches!(err, PartitionError::InvalidSnapshot { .. }), "{:?}", err);

        let m = DetailedPartitionModification::new(
            [("B", uf(0.1))].into_iter().collect(),
            HashMap::new(),
            HashMap::new(),
            [("A", uf(0.1))].into_iter().collect(),
        )
        .unwrap();
        let mut snap = ModificationSnapshot::from_detailed(&m);
        snap.categories[1].category = ModificationCategory::Add;
        let err = snap.restore_detailed().unwrap_err();
        assert!(matches!(err, PartitionError::InvalidSnapshot { .. }), "{:?}", err);
    }
}
