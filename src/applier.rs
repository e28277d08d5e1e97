/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Applying a modification to a partition.
//!
//! Application is a pure function `(Partition, Modification) -> Partition`.
//! Per-key preconditions are checked against the original partition and the
//! first violation aborts the call; since the original is never touched, a
//! failed apply leaves nothing behind.
//!
//! # Assembly
//!
//! The edited weights are assembled by one of two partition factories:
//!
//! - **strict** ([`Partition::new`]) unless the modification declared a
//!   net-addition tolerance. The sum-to-one check runs again, and any drift
//!   beyond [`DEFAULT_EPSILON`] fails.
//! - **renormalising** ([`Partition::from_weights`]) when a net-addition
//!   tolerance was declared. Every weight is rescaled so the result sums to
//!   one.

use hashbrown::HashMap;
use tracing::{debug, instrument, trace, warn};

use crate::error::{key_label, PartitionError, Result};
use crate::fraction::UnitFraction;
use crate::modification::{
    DetailedPartitionModification, ModificationCategory, PartitionModification,
    SimplePartitionModification,
};
use crate::partition::{Partition, PartitionKey};
use crate::tolerance::{ModificationTolerances, DEFAULT_EPSILON};

// ─── Public entry points ────────────────────────────────────────────────────

/// Apply a four-category modification.
///
/// 1. `to_add` keys must be absent; their fraction is written verbatim.
/// 2. `to_increase` keys must be present; the delta is added.
/// 3. `to_remove` keys must be present with the recorded weight (within the
///    removal tolerance); they are dropped from the result.
/// 4. `to_decrease` keys must be present and keep more than
///    [`DEFAULT_EPSILON`] after the delta is subtracted.
/// 5. Untouched keys are carried over unchanged.
#[instrument(level = "trace", skip_all, fields(keys = original.len()))]
pub fn apply_detailed<K: PartitionKey>(
    original: &Partition<K>,
    modification: &DetailedPartitionModification<K>,
) -> Result<Partition<K>> {
    let tolerances = modification.tolerances();
    let mut draft = Draft::new(original);

    for (key, fraction) in modification.to_add() {
        draft.add(key, *fraction, ModificationCategory::Add)?;
    }
    for (key, delta) in modification.to_increase() {
        draft.increase(key, *delta, ModificationCategory::Increase)?;
    }
    for (key, expected) in modification.to_remove() {
        draft.remove(key, *expected, tolerances.removal_epsilon())?;
    }
    for (key, delta) in modification.to_decrease() {
        draft.decrease(key, *delta, ModificationCategory::Decrease)?;
    }

    draft.assemble(&tolerances)
}

/// Apply a two-category modification, deciding per key whether it is an
/// addition or increase, and a removal or decrease.
///
/// A `to_remove_or_decrease` value that matches the key's current weight
/// within the removal tolerance removes the key; otherwise it is a decrease.
/// The tolerance used for that choice is never tighter than
/// [`DEFAULT_EPSILON`], since a decrease leaving that little behind fails.
#[instrument(level = "trace", skip_all, fields(keys = original.len()))]
pub fn apply_simple<K: PartitionKey>(
    original: &Partition<K>,
    modification: &SimplePartitionModification<K>,
) -> Result<Partition<K>> {
    let tolerances = modification.tolerances();
    let removal_epsilon = tolerances.removal_epsilon().max(DEFAULT_EPSILON);
    let mut draft = Draft::new(original);

    for (key, amount) in modification.to_add_or_increase() {
        if original.contains_key(key) {
            draft.increase(key, *amount, ModificationCategory::AddOrIncrease)?;
        } else {
            draft.add(key, *amount, ModificationCategory::AddOrIncrease)?;
        }
    }
    for (key, amount) in modification.to_remove_or_decrease() {
        let current = original.get(key).ok_or_else(|| PartitionError::KeyMissing {
            key: key_label(key),
            category: ModificationCategory::RemoveOrDecrease,
        })?;
        if current.almost_equals(*amount, removal_epsilon) {
            draft.remove(key, *amount, removal_epsilon)?;
        } else {
            draft.decrease(key, *amount, ModificationCategory::RemoveOrDecrease)?;
        }
    }

    draft.assemble(&tolerances)
}

/// Applies [`DetailedPartitionModification`]s, for callers that want to hold
/// an applier value rather than call [`apply_detailed`] directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleDetailedPartitionModificationApplier;

impl SingleDetailedPartitionModificationApplier {
    /// See [`apply_detailed`].
    pub fn apply<K: PartitionKey>(
        &self,
        original: &Partition<K>,
        modification: &DetailedPartitionModification<K>,
    ) -> Result<Partition<K>> {
        apply_detailed(original, modification)
    }
}

// ─── Draft ──────────────────────────────────────────────────────────────────

/// Result weights under construction. Starts as a copy of the original, which
/// carries over every key no category mentions.
struct Draft<'a, K: PartitionKey> {
    original: &'a Partition<K>,
    weights: HashMap<K, UnitFraction>,
    edits: usize,
}

impl<'a, K: PartitionKey> Draft<'a, K> {
    fn new(original: &'a Partition<K>) -> Self {
        Self {
            original,
            weights: original.as_map().clone(),
            edits: 0,
        }
    }

    fn present(&self, key: &K, category: ModificationCategory) -> Result<UnitFraction> {
        self.original.get(key).ok_or_else(|| PartitionError::KeyMissing {
            key: key_label(key),
            category,
        })
    }

    fn add(&mut self, key: &K, fraction: UnitFraction, category: ModificationCategory) -> Result<()> {
        if self.original.contains_key(key) {
            return Err(PartitionError::KeyAlreadyPresent {
                key: key_label(key),
                category,
            });
        }
        self.weights.insert(key.clone(), fraction);
        self.edits += 1;
        Ok(())
    }

    fn increase(&mut self, key: &K, delta: UnitFraction, category: ModificationCategory) -> Result<()> {
        let current = self.present(key, category)?;
        self.weights.insert(key.clone(), current.sum(delta)?);
        self.edits += 1;
        Ok(())
    }

    fn remove(&mut self, key: &K, expected: UnitFraction, epsilon: f64) -> Result<()> {
        let actual = self.present(key, ModificationCategory::Remove)?;
        if !actual.almost_equals(expected, epsilon) {
            return Err(PartitionError::RemovalMismatch {
                key: key_label(key),
                expected: expected.value(),
                actual: actual.value(),
                epsilon,
            });
        }
        self.weights.remove(key);
        self.edits += 1;
        Ok(())
    }

    fn decrease(&mut self, key: &K, delta: UnitFraction, category: ModificationCategory) -> Result<()> {
        let current = self.present(key, category)?;
        // A decrease must leave a real weight behind: neither negative nor a
        // zero entry. Emptying a key is a removal.
        if current.value() - delta.value() <= DEFAULT_EPSILON {
            return Err(PartitionError::ExcessiveDecrease {
                key: key_label(key),
                current: current.value(),
                delta: delta.value(),
            });
        }
        self.weights.insert(key.clone(), current.subtract(delta)?);
        self.edits += 1;
        Ok(())
    }

    fn assemble(self, tolerances: &ModificationTolerances) -> Result<Partition<K>> {
        trace!(
            edits = self.edits,
            result_keys = self.weights.len(),
            "assembling modified partition"
        );
        let result = if tolerances.renormalizes() {
            let total = UnitFraction::total(self.weights.values().copied());
            if (total - 1.0).abs() > DEFAULT_EPSILON {
                warn!(total, "renormalising modified partition past default tolerance");
            }
            Partition::from_weights(
                self.weights
                    .into_iter()
                    .map(|(k, f)| (k, f.value()))
                    .collect(),
            )
        } else {
            Partition::new(self.weights)
        };
        match &result {
            Ok(p) => debug!(keys = p.len(), "modification applied"),
            Err(e) => debug!(error = %e, "modified partition rejected"),
        }
        result
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
