//! Batch-ledger execution: load, decide, apply, commit.
//!
//! ```text
//! command
//!   ↓ take the supply's guard (shared for lot registration, exclusive otherwise)
//!   ↓ load supply + lots, rehydrate SupplyLedger
//!   ↓ handle (pure decision) → events, apply them
//!   ↓ build one Commit from the events (version-checked when the supply changes)
//!   ↓ store.commit (atomic)
//!   ↓ evaluate the supply's alerts on the stored state
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use pharmstock_core::{
    Aggregate, AggregateRoot, DomainError, ExpectedVersion, LotId, SupplyId,
};
use pharmstock_inventory::{
    AdjustStock, ConsumeLot, ExpiryHorizon, LedgerCommand, LedgerEvent, Lot, RegisterLot, Supply,
    SupplyAlertSnapshot, SupplyLedger, alerts,
};

use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::locks::SupplyLocks;
use crate::store::{Commit, SupplyStore};

/// Input for registering a replenishment lot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NewLot {
    pub label: String,
    pub quantity: i64,
    pub expiration_date: Option<NaiveDate>,
    pub unit_price: Option<Decimal>,
    pub location: Option<String>,
}

/// Result of registering a lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotReceipt {
    pub lot: Lot,
    pub alerts: SupplyAlertSnapshot,
}

/// Result of a mutation that changed the supply record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplyUpdate {
    pub supply: Supply,
    pub alerts: SupplyAlertSnapshot,
}

pub struct LedgerService<S> {
    store: S,
    locks: Arc<SupplyLocks>,
    clock: Arc<dyn Clock>,
    horizon: ExpiryHorizon,
}

impl<S> LedgerService<S>
where
    S: SupplyStore,
{
    pub fn new(store: S, locks: Arc<SupplyLocks>, clock: Arc<dyn Clock>, horizon: ExpiryHorizon) -> Self {
        Self {
            store,
            locks,
            clock,
            horizon,
        }
    }

    #[tracing::instrument(skip_all, fields(supply_id = %supply_id))]
    pub fn register_lot(&self, supply_id: SupplyId, input: NewLot) -> ServiceResult<LotReceipt> {
        let lot_id = LotId::new();
        let cmd = LedgerCommand::RegisterLot(RegisterLot {
            supply_id,
            lot_id,
            label: input.label,
            quantity: input.quantity,
            expiration_date: input.expiration_date,
            unit_price: input.unit_price,
            location: input.location,
            occurred_at: self.clock.now(),
        });

        let (ledger, supply) = self.locks.shared(supply_id, || self.dispatch(supply_id, &cmd))?;
        let lot = ledger
            .lot(lot_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("lot {lot_id}")))?;

        info!(lot_id = %lot.id, label = %lot.label, quantity = lot.quantity, "lot registered");
        Ok(LotReceipt {
            alerts: self.snapshot(&supply),
            lot,
        })
    }

    /// Lots of a supply, first-expiring first, undated last.
    pub fn list_lots(&self, supply_id: SupplyId) -> ServiceResult<Vec<Lot>> {
        let ledger = self.load(supply_id)?;
        Ok(ledger.lots_fefo())
    }

    /// Open a sealed lot into the (depleted) floor stock.
    #[tracing::instrument(skip_all, fields(supply_id = %supply_id, lot_id = %lot_id))]
    pub fn consume_lot(&self, supply_id: SupplyId, lot_id: LotId) -> ServiceResult<SupplyUpdate> {
        let cmd = LedgerCommand::ConsumeLot(ConsumeLot {
            supply_id,
            lot_id,
            occurred_at: self.clock.now(),
        });

        let (ledger, supply) = self
            .locks
            .exclusive(supply_id, || self.dispatch(supply_id, &cmd))
            .inspect_err(|e| warn!(error = %e, "lot consumption rejected"))?;

        info!(
            stock = supply.stock,
            sealed_reserve = ledger.reserve(),
            version = supply.version,
            "lot consumed into floor stock"
        );
        Ok(SupplyUpdate {
            alerts: self.snapshot(&supply),
            supply,
        })
    }

    /// Dispense from (negative delta) or correct (positive delta) floor stock.
    #[tracing::instrument(skip_all, fields(supply_id = %supply_id))]
    pub fn adjust_stock(&self, supply_id: SupplyId, delta: i64) -> ServiceResult<SupplyUpdate> {
        let cmd = LedgerCommand::AdjustStock(AdjustStock {
            supply_id,
            delta,
            occurred_at: self.clock.now(),
        });

        let (_, supply) = self
            .locks
            .exclusive(supply_id, || self.dispatch(supply_id, &cmd))?;

        info!(delta, stock = supply.stock, "floor stock adjusted");
        Ok(SupplyUpdate {
            alerts: self.snapshot(&supply),
            supply,
        })
    }

    fn load(&self, supply_id: SupplyId) -> ServiceResult<SupplyLedger> {
        let supply = self
            .store
            .get_supply(supply_id)?
            .ok_or_else(|| DomainError::not_found(format!("supply {supply_id}")))?;
        let lots = self.store.lots_for(supply_id)?;
        Ok(SupplyLedger::new(supply, lots))
    }

    /// Run one command against freshly loaded state and commit the outcome.
    /// Must be called with the supply's guard held.
    fn dispatch(
        &self,
        supply_id: SupplyId,
        cmd: &LedgerCommand,
    ) -> ServiceResult<(SupplyLedger, Supply)> {
        let mut ledger = self.load(supply_id)?;
        let loaded_version = ledger.version();

        let events = ledger.execute(cmd).map_err(ServiceError::from)?;
        let commit = build_commit(&ledger, loaded_version, &events);
        let stored = self.store.commit(commit)?;

        for event in &events {
            tracing::debug!(
                event_type = event.event_type(),
                occurred_at = %event.occurred_at(),
                "ledger event committed"
            );
        }
        Ok((ledger, stored))
    }

    fn snapshot(&self, supply: &Supply) -> SupplyAlertSnapshot {
        alerts::snapshot(supply, self.clock.today(), self.horizon)
    }
}

/// Translate applied events into the records that changed.
///
/// Appending a lot leaves the supply record alone, so it commits without a
/// version expectation; anything that rewrites the supply must match the
/// version it was loaded at.
fn build_commit(ledger: &SupplyLedger, loaded_version: u64, events: &[LedgerEvent]) -> Commit {
    let touches_supply = events
        .iter()
        .any(|e| !matches!(e, LedgerEvent::LotRegistered(_)));
    let expected = if touches_supply {
        ExpectedVersion::Exact(loaded_version)
    } else {
        ExpectedVersion::Any
    };

    let mut commit = Commit::new(*ledger.id(), expected);
    if touches_supply {
        commit.supply = Some(ledger.supply().clone());
    }
    for event in events {
        match event {
            LedgerEvent::LotRegistered(e) => commit.new_lots.push(e.lot.clone()),
            LedgerEvent::LotConsumed(e) => {
                if let Some(lot) = ledger.lot(e.lot_id) {
                    commit.updated_lots.push(lot.clone());
                }
            }
            LedgerEvent::StockAdjusted(_) => {}
        }
    }
    commit
}
