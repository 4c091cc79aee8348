//! Pharmacy batch-inventory domain.
//!
//! This crate contains the business rules for supplies, their sealed lots and
//! the alerts derived from them, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod alerts;
pub mod ledger;
pub mod lot;
pub mod supply;

pub use alerts::{
    AlertSummary, ExpirationStatus, ExpiryHorizon, StockBand, SupplyAlertSnapshot,
};
pub use ledger::{
    AdjustStock, ConsumeLot, LedgerCommand, LedgerEvent, LotConsumed, LotRegistered, RegisterLot,
    StockAdjusted, SupplyLedger,
};
pub use lot::{Lot, sort_fefo};
pub use supply::{NewSupply, Supply, SupplyPatch};
