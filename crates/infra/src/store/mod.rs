//! Durable record store interface for supplies and lots.
//!
//! The engine reads and writes only through [`SupplyStore`]. A store must make
//! each [`Commit`] atomic: either every record in it is written or none is.

pub mod in_memory;

use std::sync::Arc;

use thiserror::Error;

use pharmstock_core::{ExpectedVersion, SupplyId};
use pharmstock_inventory::{Lot, Supply};

pub use in_memory::InMemorySupplyStore;

/// Store operation error.
///
/// These are infrastructure outcomes; services translate `Concurrency` and
/// `NotFound` into domain errors and pass `Backend` through unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// One atomic unit of work against a single supply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub supply_id: SupplyId,
    /// Checked against the stored supply version before anything is written.
    pub expected_version: ExpectedVersion,
    /// New supply state. The store bumps its version on write.
    pub supply: Option<Supply>,
    pub new_lots: Vec<Lot>,
    pub updated_lots: Vec<Lot>,
}

impl Commit {
    pub fn new(supply_id: SupplyId, expected_version: ExpectedVersion) -> Self {
        Self {
            supply_id,
            expected_version,
            supply: None,
            new_lots: Vec::new(),
            updated_lots: Vec::new(),
        }
    }
}

pub trait SupplyStore: Send + Sync {
    /// Insert a new supply. The stored record starts at version 1.
    fn insert_supply(&self, supply: Supply) -> Result<Supply, StoreError>;

    fn get_supply(&self, id: SupplyId) -> Result<Option<Supply>, StoreError>;

    fn list_supplies(&self) -> Result<Vec<Supply>, StoreError>;

    /// Lots of a supply, in creation order.
    fn lots_for(&self, id: SupplyId) -> Result<Vec<Lot>, StoreError>;

    /// Apply a commit atomically and return the supply as stored afterwards.
    fn commit(&self, commit: Commit) -> Result<Supply, StoreError>;
}

impl<S> SupplyStore for Arc<S>
where
    S: SupplyStore + ?Sized,
{
    fn insert_supply(&self, supply: Supply) -> Result<Supply, StoreError> {
        (**self).insert_supply(supply)
    }

    fn get_supply(&self, id: SupplyId) -> Result<Option<Supply>, StoreError> {
        (**self).get_supply(id)
    }

    fn list_supplies(&self) -> Result<Vec<Supply>, StoreError> {
        (**self).list_supplies()
    }

    fn lots_for(&self, id: SupplyId) -> Result<Vec<Lot>, StoreError> {
        (**self).lots_for(id)
    }

    fn commit(&self, commit: Commit) -> Result<Supply, StoreError> {
        (**self).commit(commit)
    }
}
