//! Infrastructure layer: record store, per-supply locking, clock, config and
//! the application services that run the domain against them.

pub mod alert_service;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger_service;
pub mod locks;
pub mod store;

mod integration_tests;

pub use alert_service::AlertService;
pub use catalog::{ActiveFilter, CatalogService};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::{ServiceError, ServiceResult};
pub use ledger_service::{LedgerService, LotReceipt, NewLot, SupplyUpdate};
pub use locks::SupplyLocks;
pub use store::{Commit, InMemorySupplyStore, StoreError, SupplyStore};
