use std::collections::HashMap;
use std::sync::RwLock;

use pharmstock_core::SupplyId;
use pharmstock_inventory::{Lot, Supply};

use super::{Commit, StoreError, SupplyStore};

#[derive(Debug, Default)]
struct Tables {
    supplies: HashMap<SupplyId, Supply>,
    /// Per supply, in insertion (creation) order.
    lots: HashMap<SupplyId, Vec<Lot>>,
}

/// In-memory supply/lot store.
///
/// Intended for tests/dev. A single lock guards both tables so a commit is
/// applied as one unit.
#[derive(Debug, Default)]
pub struct InMemorySupplyStore {
    tables: RwLock<Tables>,
}

impl InMemorySupplyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

impl SupplyStore for InMemorySupplyStore {
    fn insert_supply(&self, mut supply: Supply) -> Result<Supply, StoreError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        if tables.supplies.contains_key(&supply.id) {
            return Err(StoreError::Concurrency(format!(
                "supply {} already exists",
                supply.id
            )));
        }

        supply.version = 1;
        tables.supplies.insert(supply.id, supply.clone());
        tables.lots.entry(supply.id).or_default();
        Ok(supply)
    }

    fn get_supply(&self, id: SupplyId) -> Result<Option<Supply>, StoreError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.supplies.get(&id).cloned())
    }

    fn list_supplies(&self) -> Result<Vec<Supply>, StoreError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.supplies.values().cloned().collect())
    }

    fn lots_for(&self, id: SupplyId) -> Result<Vec<Lot>, StoreError> {
        let tables = self.tables.read().map_err(|_| Self::poisoned())?;
        Ok(tables.lots.get(&id).cloned().unwrap_or_default())
    }

    fn commit(&self, commit: Commit) -> Result<Supply, StoreError> {
        let mut tables = self.tables.write().map_err(|_| Self::poisoned())?;
        let Tables { supplies, lots } = &mut *tables;

        let current = supplies
            .get(&commit.supply_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("supply {}", commit.supply_id)))?;

        if !commit.expected_version.matches(current.version) {
            return Err(StoreError::Concurrency(format!(
                "supply {}: expected {:?}, found {}",
                commit.supply_id, commit.expected_version, current.version
            )));
        }
        if let Some(next) = &commit.supply {
            if next.id != commit.supply_id {
                return Err(StoreError::Backend("commit mixes supplies".to_string()));
            }
        }

        // Validate every lot write before touching anything.
        let stored_lots = lots.entry(commit.supply_id).or_default();
        for lot in commit.new_lots.iter().chain(commit.updated_lots.iter()) {
            if lot.supply_id != commit.supply_id {
                return Err(StoreError::Backend(format!(
                    "lot {} does not belong to supply {}",
                    lot.id, commit.supply_id
                )));
            }
        }
        for lot in &commit.new_lots {
            if stored_lots.iter().any(|l| l.id == lot.id) {
                return Err(StoreError::Concurrency(format!("lot {} already exists", lot.id)));
            }
        }
        for lot in &commit.updated_lots {
            let existing = stored_lots
                .iter()
                .find(|l| l.id == lot.id)
                .ok_or_else(|| StoreError::NotFound(format!("lot {}", lot.id)))?;
            if existing.quantity != lot.quantity {
                return Err(StoreError::Backend(format!(
                    "lot {} original quantity is immutable",
                    lot.id
                )));
            }
            // Remaining only ever goes down, straight to 0, and only once.
            if lot.remaining != existing.remaining
                && (existing.is_exhausted() || !lot.is_exhausted())
            {
                return Err(StoreError::Concurrency(format!(
                    "lot {} changed concurrently (stored remaining: {})",
                    lot.id, existing.remaining
                )));
            }
        }

        for lot in commit.updated_lots {
            if let Some(slot) = stored_lots.iter_mut().find(|l| l.id == lot.id) {
                *slot = lot;
            }
        }
        stored_lots.extend(commit.new_lots);

        let stored = match commit.supply {
            Some(mut next) => {
                next.version = current.version + 1;
                supplies.insert(next.id, next.clone());
                next
            }
            None => current,
        };
        Ok(stored)
    }
}
