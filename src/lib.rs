//! # simplex-edit
//!
//! Validated weight partitions over arbitrary keys, and balanced,
//! invariant-preserving edits to them.
//!
//! ---
//!
//! ## Partitions are points on the simplex
//!
//! A [`Partition`] assigns every key a strictly positive [`UnitFraction`], and
//! the fractions sum to one. Zero membership is absence, never a stored zero.
//! Partitions are checked once, at construction, and are immutable afterwards.
//!
//! ## Modifications are validated before they exist
//!
//! A modification describes weight moving between keys. It can only be
//! obtained from a builder that rejects:
//!
//! - the same key in two categories,
//! - entries indistinguishable from zero (a no-op must be omitted),
//! - additions that do not balance subtractions,
//! - moving more than the whole partition.
//!
//! ## Applying re-checks against the concrete partition
//!
//! The applier verifies that added keys are new, changed keys exist, removed
//! keys still hold the weight the modification recorded, and decreased keys
//! keep a positive weight. The result is assembled by a partition factory, so
//! it satisfies the same invariants as any other partition.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! weights ──► Partition ──────────────┐
//!                                     ▼
//! entries ──► Builder ──► Modification ──► applier ──► Partition
//!               │                            │
//!          shape checks               per-key checks + strict
//!                                     or renormalising assembly
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`tolerance`] | [`ModificationTolerances`], [`DEFAULT_EPSILON`] | Shared numeric tolerances |
//! | [`fraction`] | [`UnitFraction`] | Bounded `[0, 1]` value with epsilon comparisons |
//! | [`partition`] | [`Partition`], [`PartitionKey`] | Validated weight distribution |
//! | [`signed`] | [`SignedPartition`] | Unconstrained weights for derived calculations |
//! | [`modification`] | [`DetailedPartitionModification`], [`SimplePartitionModification`] | Validated edits and their builders |
//! | [`applier`] | [`apply_detailed`], [`apply_simple`] | Produce a new partition from an old one and an edit |
//! | [`error`] | [`PartitionError`], [`ErrorKind`] | Failure taxonomy |
//! | `snapshot` | `PartitionSnapshot`, `ModificationSnapshot` | Serialisable snapshots (requires `serde` feature) |
//!
//! ## Example
//!
//! ```rust,ignore
//! use simplex_edit::{DetailedPartitionModification, Partition, PartitionModification};
//!
//! let original = Partition::from_weights([("A", 1.0), ("B", 1.0)].into_iter().collect())?;
//! let modification = DetailedPartitionModification::builder()
//!     .keys_to_add([("C", UnitFraction::new(0.2)?)].into_iter().collect())
//!     .no_keys_to_increase()
//!     .no_keys_to_remove()
//!     .keys_to_decrease([("A", UnitFraction::new(0.2)?)].into_iter().collect())
//!     .build()?;
//! let updated = modification.apply_to(&original)?;   // {A: 0.3, B: 0.5, C: 0.2}
//! ```
//!
//! ## `no_std`
//!
//! This crate is `#![no_std]` by default and needs only `alloc`. Enable the
//! `std` feature to let dependencies use `std`, and the `serde` feature for
//! snapshots.
//!
//! ## Logging
//!
//! The applier emits `tracing` events (`debug` per apply, `warn` when
//! renormalisation absorbs drift). Install any subscriber to see them.
//!
//! ## License
//!
//! Business Source License 1.1.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

pub mod applier;
pub mod error;
pub mod fraction;
pub mod modification;
pub mod partition;
pub mod signed;
#[cfg(feature = "serde")]
pub mod snapshot;
pub mod tolerance;

pub use applier::{apply_detailed, apply_simple, SingleDetailedPartitionModificationApplier};
pub use error::{ErrorKind, PartitionError, Result};
pub use fraction::UnitFraction;
pub use modification::{
    DetailedPartitionModification, DetailedPartitionModificationBuilder, ModificationCategory,
    PartitionModification, SimplePartitionModification, SimplePartitionModificationBuilder,
};
pub use partition::{Partition, PartitionKey};
pub use signed::SignedPartition;
pub use tolerance::{ModificationTolerances, DEFAULT_EPSILON, ROUNDING_SLACK, ZERO_WEIGHT_THRESHOLD};

/// Re-exported map type used throughout the public API.
pub use hashbrown::HashMap;
