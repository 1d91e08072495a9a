#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Known use certainty, lot group geometry, and lot maintenance services.
//!
//! The two pieces of real decision logic live in [`certainty`] (how sure we
//! are that a lot's known use is right) and [`group`] (keeping a lot
//! group's polygon and centroid in sync with its members). Everything that
//! reads or writes stored lots goes through the [`LotRepository`] trait so
//! the same rules run against `DuckDB` in production and the in-memory
//! [`memory::MemoryLotStore`] in tests.

pub mod certainty;
pub mod group;
pub mod measure;
pub mod memory;
pub mod nearby;
pub mod registry;
pub mod service;
pub mod visibility;

use living_lots_lot_models::{Lot, LotDetails, LotGroup, Parcel, Use};
use thiserror::Error;

/// Errors that can occur during lot operations.
#[derive(Debug, Error)]
pub enum LotError {
    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of what went wrong.
        message: String,
    },

    /// No lot exists with the given id.
    #[error("Lot {id} not found")]
    LotNotFound {
        /// The missing lot id.
        id: i64,
    },

    /// No lot group exists with the given id.
    #[error("Lot group {id} not found")]
    GroupNotFound {
        /// The missing group id.
        id: i64,
    },

    /// A lot group cannot be a member of a group.
    #[error("Lot {id} is a group and cannot join group {group_id}")]
    NestedGroup {
        /// The group that was asked to join.
        id: i64,
        /// The group it was asked to join.
        group_id: i64,
    },
}

/// Read/write access to stored lots and the records linked to them.
///
/// Groups are stored as lots with [`Lot::is_group`] set, so
/// [`Self::save_group`] and [`Self::save_lot`] may share a table.
pub trait LotRepository {
    /// Fetches a single lot (group or not).
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn lot(&self, id: i64) -> Result<Option<Lot>, LotError>;

    /// Fetches every lot, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn lots(&self) -> Result<Vec<Lot>, LotError>;

    /// Fetches lots that pass the public listing filter, ordered by id.
    ///
    /// See [`visibility::is_publicly_listed`].
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn visible_lots(&self) -> Result<Vec<Lot>, LotError>;

    /// Fetches a lot joined with its linked records.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn lot_details(&self, id: i64) -> Result<Option<LotDetails>, LotError>;

    /// Fetches the current members of a group, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn group_members(&self, group_id: i64) -> Result<Vec<Lot>, LotError>;

    /// Fetches a parcel.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn parcel(&self, id: i64) -> Result<Option<Parcel>, LotError>;

    /// Fetches a known use classification.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn known_use(&self, id: i64) -> Result<Option<Use>, LotError>;

    /// Returns an id not used by any stored lot.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn next_lot_id(&self) -> Result<i64, LotError>;

    /// Inserts or replaces a lot row as-is. No group maintenance happens
    /// here; callers that change membership go through [`service`].
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the write fails.
    fn save_lot(&mut self, lot: &Lot) -> Result<(), LotError>;

    /// Inserts or replaces a group row.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the write fails.
    fn save_group(&mut self, group: &LotGroup) -> Result<(), LotError>;

    /// Deletes a lot row. Members of a deleted group are detached.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the write fails.
    fn delete_lot(&mut self, id: i64) -> Result<(), LotError>;

    /// Fetches a group by id.
    ///
    /// # Errors
    ///
    /// Returns [`LotError::Storage`] if the store cannot be read.
    fn group(&self, id: i64) -> Result<Option<LotGroup>, LotError> {
        Ok(self.lot(id)?.and_then(LotGroup::from_lot))
    }
}
