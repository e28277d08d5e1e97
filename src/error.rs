/*
 * This source code is licensed under the Business Source License 1.1.
 * See LICENSE in the root directory for full details.
 */

//! Error type for partition construction, modification building and applying.
//!
//! Every failure is synchronous and final: nothing here is retryable, and no
//! layer recovers silently. Keys are captured through their `Debug` rendering
//! so the error type stays independent of the key type.

use alloc::string::String;

use crate::modification::ModificationCategory;

/// Crate-wide result alias.
pub type Result<T, E = PartitionError> = core::result::Result<T, E>;

/// Coarse classification of a [`PartitionError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A builder was finished with a category left unset, or an invalid
    /// tolerance override.
    Configuration,
    /// A key appears in more than one modification category.
    Overlap,
    /// A modification entry is within epsilon of zero.
    TrivialEntry,
    /// Additive and subtractive totals do not cancel out.
    Balance,
    /// A value falls outside `[0, 1]`, or a decrease would exhaust a key.
    Range,
    /// A partition factory rejected its input.
    Construction,
    /// A key's presence or weight in the partition contradicts the modification.
    Precondition,
}

/// Everything that can go wrong in this crate.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum PartitionError {
    // === Configuration ===
    /// `build()` was called before every category was set.
    #[error("modification category {category} was never set; use an explicit no-keys setter for an empty category")]
    Unconfigured {
        /// The category left unset.
        category: ModificationCategory,
    },

    /// A tolerance override is negative, non-finite or not below one.
    #[error("tolerance override {name} = {value} must be finite and in [0, 1)")]
    InvalidTolerance {
        /// Name of the override.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    // === Modification shape ===
    /// The same key was supplied to two categories.
    #[error("key {key} appears in both {first} and {second}")]
    OverlappingKey {
        /// Offending key.
        key: String,
        /// Category where the key was seen first.
        first: ModificationCategory,
        /// Category where it was seen again.
        second: ModificationCategory,
    },

    /// An entry is a no-op and should be omitted instead.
    #[error("{category} entry for key {key} is {value}, which is indistinguishable from zero")]
    TrivialEntry {
        /// Offending key.
        key: String,
        /// Category holding the entry.
        category: ModificationCategory,
        /// The near-zero value.
        value: f64,
    },

    /// Additions and subtractions do not net out to zero.
    #[error("modification adds {additive} but subtracts {subtractive} (tolerance {epsilon})")]
    Unbalanced {
        /// Total of the additive categories.
        additive: f64,
        /// Total of the subtractive categories.
        subtractive: f64,
        /// Tolerance the difference was checked against.
        epsilon: f64,
    },

    // === Range ===
    /// The additive total is not itself a valid fraction.
    #[error("modification moves {total} of the partition, more than the whole")]
    AdditiveTotalOutOfRange {
        /// Additive total.
        total: f64,
    },

    /// A value is outside `[0, 1]`.
    #[error("{value} is not a fraction in [0, 1]")]
    FractionOutOfRange {
        /// Rejected value.
        value: f64,
    },

    /// Decreasing a key would leave it at or below zero.
    #[error("cannot decrease key {key} by {delta}: it only holds {current}; use a removal instead")]
    ExcessiveDecrease {
        /// Offending key.
        key: String,
        /// Weight the key currently holds.
        current: f64,
        /// Requested decrease.
        delta: f64,
    },

    // === Partition construction ===
    /// A partition entry was explicitly zero.
    #[error("partition entry for key {key} is zero; absent keys must be omitted")]
    ZeroEntry {
        /// Offending key.
        key: String,
    },

    /// Fractions do not sum to one.
    #[error("partition fractions sum to {sum}, not 1 (tolerance {epsilon})")]
    SumNotOne {
        /// Actual sum.
        sum: f64,
        /// Tolerance the sum was checked against.
        epsilon: f64,
    },

    /// The same key was inserted twice.
    #[error("key {key} was supplied more than once")]
    DuplicateKey {
        /// Offending key.
        key: String,
    },

    /// A weight passed to a normalising factory was negative.
    #[error("weight for key {key} is negative ({weight})")]
    NegativeWeight {
        /// Offending key.
        key: String,
        /// Rejected weight.
        weight: f64,
    },

    /// A weight was NaN, infinite or too large to normalise.
    #[error("weight for key {key} cannot be normalised ({weight})")]
    NonFiniteWeight {
        /// Offending key.
        key: String,
        /// Rejected weight.
        weight: f64,
    },

    /// Every weight was zero, so there is nothing to normalise.
    #[error("no positive weight to normalise across {count} entries")]
    NoPositiveWeight {
        /// Number of entries supplied.
        count: usize,
    },

    /// A persisted snapshot could not be restored.
    #[error("invalid snapshot: {detail}")]
    InvalidSnapshot {
        /// What was wrong.
        detail: String,
    },

    // === Apply-time preconditions ===
    /// An addition targeted a key the partition already holds.
    #[error("cannot apply {category} to key {key}: it is already in the partition")]
    KeyAlreadyPresent {
        /// Offending key.
        key: String,
        /// Category that required absence.
        category: ModificationCategory,
    },

    /// A change targeted a key the partition does not hold.
    #[error("cannot apply {category} to key {key}: it is not in the partition")]
    KeyMissing {
        /// Offending key.
        key: String,
        /// Category that required presence.
        category: ModificationCategory,
    },

    /// A removal recorded a weight that does not match the partition.
    #[error("removal of key {key} expected weight {expected} but the partition holds {actual} (tolerance {epsilon})")]
    RemovalMismatch {
        /// Offending key.
        key: String,
        /// Weight recorded in the modification.
        expected: f64,
        /// Weight in the partition.
        actual: f64,
        /// Tolerance used.
        epsilon: f64,
    },

    /// A lookup required a key that is absent.
    #[error("key {key} is not in the partition")]
    KeyNotFound {
        /// Offending key.
        key: String,
    },
}

impl PartitionError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unconfigured { .. } | Self::InvalidTolerance { .. } => ErrorKind::Configuration,
            Self::OverlappingKey { .. } => ErrorKind::Overlap,
            Self::TrivialEntry { .. } => ErrorKind::TrivialEntry,
            Self::Unbalanced { .. } => ErrorKind::Balance,
            Self::AdditiveTotalOutOfRange { .. }
            | Self::FractionOutOfRange { .. }
            | Self::ExcessiveDecrease { .. } => ErrorKind::Range,
            Self::ZeroEntry { .. }
            | Self::SumNotOne { .. }
            | Self::DuplicateKey { .. }
            | Self::NegativeWeight { .. }
            | Self::NonFiniteWeight { .. }
            | Self::NoPositiveWeight { .. }
            | Self::InvalidSnapshot { .. } => ErrorKind::Construction,
            Self::KeyAlreadyPresent { .. }
            | Self::KeyMissing { .. }
            | Self::RemovalMismatch { .. }
            | Self::KeyNotFound { .. } => ErrorKind::Precondition,
        }
    }
}

/// Render a key for inclusion in an error.
pub(crate) fn key_label<K: core::fmt::Debug>(key: &K) -> String {
    alloc::format!("{:?}", key)
}
