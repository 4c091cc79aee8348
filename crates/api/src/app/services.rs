use std::sync::Arc;

use pharmstock_infra::{
    AlertService, AppConfig, CatalogService, Clock, InMemorySupplyStore, LedgerService,
    ServiceError, ServiceResult, StoreError, SupplyLocks, SystemClock,
};
use pharmstock_inventory::ExpiryHorizon;

pub type Store = Arc<InMemorySupplyStore>;

/// Services shared by every handler. All three see the same store, and the
/// catalog and ledger share one lock registry so their writes on a supply
/// are serialized.
///
/// The services are synchronous and guard state with std locks. Reads only
/// touch the store's short in-memory critical sections and are called
/// inline; writes may wait behind another writer on the same supply, so
/// handlers run them through [`run_blocking`].
pub struct AppServices {
    pub catalog: CatalogService<Store>,
    pub ledger: LedgerService<Store>,
    pub alerts: AlertService<Store>,
}

impl AppServices {
    /// In-memory store on the wall clock.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::with_clock(
            Arc::new(InMemorySupplyStore::new()),
            Arc::new(SystemClock),
            config.expiry_horizon,
        )
    }

    pub fn with_clock(store: Store, clock: Arc<dyn Clock>, horizon: ExpiryHorizon) -> Self {
        let locks = Arc::new(SupplyLocks::new());
        Self {
            catalog: CatalogService::new(store.clone(), locks.clone()),
            ledger: LedgerService::new(store.clone(), locks, clock.clone(), horizon),
            alerts: AlertService::new(store, clock, horizon),
        }
    }
}

/// Run a service call on tokio's blocking pool so a writer waiting on a
/// supply's lock never stalls a runtime worker.
pub async fn run_blocking<T, F>(services: Arc<AppServices>, f: F) -> ServiceResult<T>
where
    F: FnOnce(&AppServices) -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(move || f(&services)).await {
        Ok(result) => result,
        Err(e) => Err(ServiceError::Store(StoreError::Backend(format!(
            "service task failed: {e}"
        )))),
    }
}
