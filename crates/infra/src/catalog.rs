//! Supply catalog: create, edit, list, retire and reactivate supplies.

use std::sync::Arc;

use tracing::info;

use pharmstock_core::{DomainError, ExpectedVersion, SupplyId};
use pharmstock_inventory::{NewSupply, Supply, SupplyPatch};

use crate::error::ServiceResult;
use crate::locks::SupplyLocks;
use crate::store::{Commit, SupplyStore};

/// Which supplies a listing returns.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ActiveFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl ActiveFilter {
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            None => ActiveFilter::All,
            Some(true) => ActiveFilter::Active,
            Some(false) => ActiveFilter::Inactive,
        }
    }

    fn keeps(self, supply: &Supply) -> bool {
        match self {
            ActiveFilter::All => true,
            ActiveFilter::Active => supply.active,
            ActiveFilter::Inactive => !supply.active,
        }
    }
}

#[derive(Debug)]
pub struct CatalogService<S> {
    store: S,
    locks: Arc<SupplyLocks>,
}

impl<S> CatalogService<S>
where
    S: SupplyStore,
{
    pub fn new(store: S, locks: Arc<SupplyLocks>) -> Self {
        Self { store, locks }
    }

    #[tracing::instrument(skip_all)]
    pub fn create_supply(&self, input: NewSupply) -> ServiceResult<Supply> {
        let supply = Supply::create(SupplyId::new(), input)?;
        let stored = self.store.insert_supply(supply)?;
        info!(supply_id = %stored.id, name = %stored.name, stock = stored.stock, "supply created");
        Ok(stored)
    }

    pub fn get_supply(&self, id: SupplyId) -> ServiceResult<Supply> {
        self.store
            .get_supply(id)?
            .ok_or_else(|| DomainError::not_found(format!("supply {id}")).into())
    }

    /// Supplies matching `filter`, ordered by name.
    pub fn list_supplies(&self, filter: ActiveFilter) -> ServiceResult<Vec<Supply>> {
        let mut supplies: Vec<Supply> = self
            .store
            .list_supplies()?
            .into_iter()
            .filter(|s| filter.keeps(s))
            .collect();
        supplies.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(supplies)
    }

    /// Partial update, serialized with ledger writes on the same supply.
    #[tracing::instrument(skip_all, fields(supply_id = %id))]
    pub fn update_supply(&self, id: SupplyId, patch: SupplyPatch) -> ServiceResult<Supply> {
        self.locks.exclusive(id, || {
            let mut supply = self.get_supply(id)?;
            if patch.is_empty() {
                return Ok(supply);
            }
            let expected = ExpectedVersion::Exact(supply.version);
            supply.apply_patch(patch)?;

            let mut commit = Commit::new(id, expected);
            commit.supply = Some(supply);
            let stored = self.store.commit(commit)?;
            info!(version = stored.version, active = stored.active, "supply updated");
            Ok(stored)
        })
    }

    /// Soft delete (`false`) or reactivate (`true`). History is never removed.
    pub fn set_active(&self, id: SupplyId, active: bool) -> ServiceResult<Supply> {
        self.update_supply(
            id,
            SupplyPatch {
                active: Some(active),
                ..SupplyPatch::default()
            },
        )
    }
}
