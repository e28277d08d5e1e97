/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Unconstrained weights for derived calculations that temporarily leave the
//! simplex.

use hashbrown::HashMap;

use crate::error::Result;
use crate::partition::{Partition, PartitionKey};

/// Key → weight mapping with no sign or sum constraint.
///
/// Obtained losslessly from [`Partition::to_signed_partition`]; the only way
/// back is [`SignedPartition::try_into_partition`], which re-validates.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedPartition<K: PartitionKey> {
    weights: HashMap<K, f64>,
}

impl<K: PartitionKey> SignedPartition<K> {
    /// Wrap arbitrary weights.
    pub fn from_map(weights: HashMap<K, f64>) -> Self {
        Self { weights }
    }

    /// Weight for `key`, if present.
    pub fn get(&self, key: &K) -> Option<f64> {
        self.weights.get(key).copied()
    }

    /// Weight for `key`, or `0.0` if absent.
    pub fn get_or_zero(&self, key: &K) -> f64 {
        self.get(key).unwrap_or(0.0)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// `(key, weight)` pairs, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> {
        self.weights.iter().map(|(k, w)| (k, *w))
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    /// Multiply every weight by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            weights: self
                .weights
                .iter()
                .map(|(k, w)| (k.clone(), w * factor))
                .collect(),
        }
    }

    /// Key-wise sum; keys missing on one side count as zero.
    pub fn plus(&self, other: &Self) -> Self {
        let mut weights = self.weights.clone();
        for (k, w) in &other.weights {
            *weights.entry(k.clone()).or_insert(0.0) += w;
        }
        Self { weights }
    }

    /// Convert back through the normalising factory
    /// ([`Partition::from_weights`]): negligible weights are dropped, negative
    /// ones fail.
    pub fn try_into_partition(self) -> Result<Partition<K>> {
        Partition::from_weights(self.weights)
    }
}
