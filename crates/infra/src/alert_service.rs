//! Read-side alert queries over the current catalog.
//!
//! No locking beyond the store's own read consistency: results may trail a
//! concurrent mutation slightly, which is acceptable for dashboards.

use std::sync::Arc;

use pharmstock_core::{DomainError, SupplyId};
use pharmstock_inventory::{AlertSummary, ExpiryHorizon, Supply, SupplyAlertSnapshot, alerts};

use crate::clock::Clock;
use crate::error::ServiceResult;
use crate::store::SupplyStore;

pub struct AlertService<S> {
    store: S,
    clock: Arc<dyn Clock>,
    default_horizon: ExpiryHorizon,
}

impl<S> AlertService<S>
where
    S: SupplyStore,
{
    pub fn new(store: S, clock: Arc<dyn Clock>, default_horizon: ExpiryHorizon) -> Self {
        Self {
            store,
            clock,
            default_horizon,
        }
    }

    pub fn low_stock_alerts(&self) -> ServiceResult<Vec<Supply>> {
        let supplies = self.store.list_supplies()?;
        Ok(alerts::low_stock(&supplies))
    }

    /// Supplies expiring within `horizon_days` (configured default when `None`).
    pub fn expiring_soon_alerts(&self, horizon_days: Option<i64>) -> ServiceResult<Vec<Supply>> {
        let horizon = self.horizon(horizon_days)?;
        let supplies = self.store.list_supplies()?;
        Ok(alerts::expiring_soon(&supplies, self.clock.today(), horizon))
    }

    pub fn expired_alerts(&self) -> ServiceResult<Vec<Supply>> {
        let supplies = self.store.list_supplies()?;
        Ok(alerts::expired(&supplies, self.clock.today()))
    }

    pub fn summary(&self, horizon_days: Option<i64>) -> ServiceResult<AlertSummary> {
        let horizon = self.horizon(horizon_days)?;
        let supplies = self.store.list_supplies()?;
        Ok(alerts::summary(&supplies, self.clock.today(), horizon))
    }

    pub fn supply_snapshot(&self, supply_id: SupplyId) -> ServiceResult<SupplyAlertSnapshot> {
        let supply = self
            .store
            .get_supply(supply_id)?
            .ok_or_else(|| DomainError::not_found(format!("supply {supply_id}")))?;
        Ok(alerts::snapshot(&supply, self.clock.today(), self.default_horizon))
    }

    fn horizon(&self, days: Option<i64>) -> ServiceResult<ExpiryHorizon> {
        match days {
            Some(d) => Ok(ExpiryHorizon::days(d)?),
            None => Ok(self.default_horizon),
        }
    }
}
