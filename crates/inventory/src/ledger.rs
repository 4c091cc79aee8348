//! Batch ledger: a supply's floor stock together with its pool of sealed lots.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use pharmstock_core::{Aggregate, AggregateRoot, DomainError, DomainResult, LotId, SupplyId};

use crate::lot::{Lot, sort_fefo};
use crate::supply::{Supply, ensure_price, normalize_text};

/// Aggregate root: one supply and every lot registered against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupplyLedger {
    supply: Supply,
    lots: Vec<Lot>,
}

impl SupplyLedger {
    /// Rehydrate from stored state. `lots` must be in creation order.
    pub fn new(supply: Supply, lots: Vec<Lot>) -> Self {
        Self { supply, lots }
    }

    pub fn supply(&self) -> &Supply {
        &self.supply
    }

    /// Lots in creation order.
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Lots in first-expire-first-out order (undated last, ties by creation).
    pub fn lots_fefo(&self) -> Vec<Lot> {
        let mut lots = self.lots.clone();
        sort_fefo(&mut lots);
        lots
    }

    pub fn lot(&self, lot_id: LotId) -> Option<&Lot> {
        self.lots.iter().find(|l| l.id == lot_id)
    }

    /// Sealed quantity still held in lots.
    pub fn reserve(&self) -> i64 {
        self.lots.iter().map(|l| l.remaining).sum()
    }
}

impl AggregateRoot for SupplyLedger {
    type Id = SupplyId;

    fn id(&self) -> &Self::Id {
        &self.supply.id
    }

    fn version(&self) -> u64 {
        self.supply.version
    }
}

/// Command: RegisterLot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterLot {
    pub supply_id: SupplyId,
    pub lot_id: LotId,
    pub label: String,
    pub quantity: i64,
    pub expiration_date: Option<NaiveDate>,
    pub unit_price: Option<Decimal>,
    pub location: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConsumeLot (open the next sealed reserve into floor stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumeLot {
    pub supply_id: SupplyId,
    pub lot_id: LotId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock (dispense from, or correct, floor stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub supply_id: SupplyId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerCommand {
    RegisterLot(RegisterLot),
    ConsumeLot(ConsumeLot),
    AdjustStock(AdjustStock),
}

/// Event: LotRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotRegistered {
    pub lot: Lot,
}

/// Event: LotConsumed.
///
/// Carries everything the supply record copies from the lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotConsumed {
    pub supply_id: SupplyId,
    pub lot_id: LotId,
    pub quantity: i64,
    pub label: String,
    pub expiration_date: Option<NaiveDate>,
    pub unit_price: Option<Decimal>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub supply_id: SupplyId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    LotRegistered(LotRegistered),
    LotConsumed(LotConsumed),
    StockAdjusted(StockAdjusted),
}

impl LedgerEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            LedgerEvent::LotRegistered(_) => "pharmacy.lot.registered",
            LedgerEvent::LotConsumed(_) => "pharmacy.lot.consumed",
            LedgerEvent::StockAdjusted(_) => "pharmacy.supply.stock_adjusted",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::LotRegistered(e) => e.lot.received_at,
            LedgerEvent::LotConsumed(e) => e.occurred_at,
            LedgerEvent::StockAdjusted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SupplyLedger {
    type Command = LedgerCommand;
    type Event = LedgerEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LedgerEvent::LotRegistered(e) => {
                self.lots.push(e.lot.clone());
            }
            LedgerEvent::LotConsumed(e) => {
                if let Some(lot) = self.lots.iter_mut().find(|l| l.id == e.lot_id) {
                    lot.remaining = 0;
                }
                self.supply.stock = e.quantity;
                self.supply.lot_label = Some(e.label.clone());
                self.supply.expiration_date = e.expiration_date;
                if e.unit_price.is_some() {
                    self.supply.unit_price = e.unit_price;
                }
            }
            LedgerEvent::StockAdjusted(e) => {
                self.supply.stock += e.delta;
            }
        }
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LedgerCommand::RegisterLot(cmd) => self.handle_register(cmd),
            LedgerCommand::ConsumeLot(cmd) => self.handle_consume(cmd),
            LedgerCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
        }
    }
}

impl SupplyLedger {
    fn ensure_supply_id(&self, supply_id: SupplyId) -> DomainResult<()> {
        if self.supply.id != supply_id {
            return Err(DomainError::validation("supply_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterLot) -> DomainResult<Vec<LedgerEvent>> {
        self.ensure_supply_id(cmd.supply_id)?;

        let label = cmd.label.trim();
        if label.is_empty() {
            return Err(DomainError::validation("lot label cannot be empty"));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("lot quantity must be greater than 0"));
        }
        ensure_price(cmd.unit_price)?;
        if self.lot(cmd.lot_id).is_some() {
            return Err(DomainError::conflict(format!("lot {} already exists", cmd.lot_id)));
        }

        Ok(vec![LedgerEvent::LotRegistered(LotRegistered {
            lot: Lot {
                id: cmd.lot_id,
                supply_id: cmd.supply_id,
                label: label.to_string(),
                quantity: cmd.quantity,
                remaining: cmd.quantity,
                expiration_date: cmd.expiration_date,
                unit_price: cmd.unit_price,
                location: normalize_text(cmd.location.clone()),
                active: true,
                received_at: cmd.occurred_at,
            },
        })])
    }

    fn handle_consume(&self, cmd: &ConsumeLot) -> DomainResult<Vec<LedgerEvent>> {
        self.ensure_supply_id(cmd.supply_id)?;

        // An exhausted lot is as good as absent: it can never be opened again.
        let lot = self
            .lot(cmd.lot_id)
            .filter(|l| l.is_available())
            .ok_or_else(|| {
                DomainError::not_found(format!(
                    "lot {} not found for supply {} or already consumed",
                    cmd.lot_id, cmd.supply_id
                ))
            })?;

        if self.supply.stock != 0 {
            return Err(DomainError::precondition(format!(
                "a lot can only be opened once floor stock is depleted (current floor stock: {})",
                self.supply.stock
            )));
        }

        Ok(vec![LedgerEvent::LotConsumed(LotConsumed {
            supply_id: cmd.supply_id,
            lot_id: lot.id,
            quantity: lot.remaining,
            label: lot.label.clone(),
            expiration_date: lot.expiration_date,
            unit_price: lot.unit_price,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> DomainResult<Vec<LedgerEvent>> {
        self.ensure_supply_id(cmd.supply_id)?;

        if cmd.delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let new_stock = self
            .supply
            .stock
            .checked_add(cmd.delta)
            .ok_or_else(|| DomainError::validation("delta out of range"))?;
        if new_stock < 0 {
            return Err(DomainError::precondition(format!(
                "floor stock cannot go negative (current: {}, delta: {})",
                self.supply.stock, cmd.delta
            )));
        }

        Ok(vec![LedgerEvent::StockAdjusted(StockAdjusted {
            supply_id: cmd.supply_id,
            delta: cmd.delta,
            occurred_at: cmd.occurred_at,
        })])
    }
}
