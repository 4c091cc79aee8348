//! Integration tests for the service pipeline.
//!
//! Tests: Catalog / Ledger command → SupplyStore commit → alert evaluation
//!
//! Verifies:
//! - The lot scenarios end to end, including FEFO listing
//! - Consume is all-or-nothing and serialized per supply
//! - Stale writers lose with a conflict

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier};
    use std::thread;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use pharmstock_core::{DomainError, ExpectedVersion, LotId, SupplyId};
    use pharmstock_inventory::{ExpirationStatus, Lot, NewSupply, StockBand, Supply, SupplyPatch};

    use crate::alert_service::AlertService;
    use crate::catalog::{ActiveFilter, CatalogService};
    use crate::clock::{Clock, FixedClock};
    use crate::error::ServiceError;
    use crate::ledger_service::{LedgerService, NewLot};
    use crate::locks::SupplyLocks;
    use crate::store::{Commit, InMemorySupplyStore, StoreError, SupplyStore};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Harness<S> {
        store: S,
        locks: Arc<SupplyLocks>,
        catalog: CatalogService<S>,
        ledger: LedgerService<S>,
        alerts: AlertService<S>,
    }

    fn harness_with<S>(store: S) -> Harness<S>
    where
        S: SupplyStore + Clone,
    {
        let locks = Arc::new(SupplyLocks::new());
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::on(date(2025, 1, 1)));
        Harness {
            catalog: CatalogService::new(store.clone(), locks.clone()),
            ledger: LedgerService::new(store.clone(), locks.clone(), clock.clone(), Default::default()),
            alerts: AlertService::new(store.clone(), clock, Default::default()),
            locks,
            store,
        }
    }

    fn harness() -> Harness<Arc<InMemorySupplyStore>> {
        harness_with(Arc::new(InMemorySupplyStore::new()))
    }

    fn create<S: SupplyStore>(h: &Harness<S>, name: &str, stock: i64, min_stock: i64) -> Supply {
        h.catalog
            .create_supply(NewSupply {
                name: name.to_string(),
                stock,
                min_stock,
                ..NewSupply::default()
            })
            .unwrap()
    }

    fn new_lot(label: &str, quantity: i64, expiration: Option<NaiveDate>) -> NewLot {
        NewLot {
            label: label.to_string(),
            quantity,
            expiration_date: expiration,
            ..NewLot::default()
        }
    }

    fn domain_err<T: std::fmt::Debug>(result: Result<T, ServiceError>) -> DomainError {
        match result {
            Err(ServiceError::Domain(e)) => e,
            other => panic!("expected domain error, got {other:?}"),
        }
    }

    #[test]
    fn fefo_listing_and_consume_scenario() {
        let h = harness();
        let supply = create(&h, "Ceftriaxona 1g", 0, 10);

        let a = h
            .ledger
            .register_lot(supply.id, new_lot("A", 100, Some(date(2025, 3, 1))))
            .unwrap();
        let b = h
            .ledger
            .register_lot(supply.id, new_lot("B", 50, Some(date(2025, 1, 15))))
            .unwrap();

        // Registering lots leaves floor stock at 0, so the supply stays critical.
        assert_eq!(b.alerts.band, StockBand::Critical);
        assert!(b.alerts.low_stock);

        let listed: Vec<LotId> = h.ledger.list_lots(supply.id).unwrap().iter().map(|l| l.id).collect();
        assert_eq!(listed, vec![b.lot.id, a.lot.id]);

        let update = h.ledger.consume_lot(supply.id, b.lot.id).unwrap();
        assert_eq!(update.supply.stock, 50);
        assert_eq!(update.supply.lot_label.as_deref(), Some("B"));
        assert_eq!(update.supply.expiration_date, Some(date(2025, 1, 15)));
        assert!(!update.alerts.low_stock);
        assert_eq!(
            update.alerts.expiration,
            ExpirationStatus::ExpiringSoon { days_remaining: 14 }
        );

        let lots = h.ledger.list_lots(supply.id).unwrap();
        let consumed = lots.iter().find(|l| l.id == b.lot.id).unwrap();
        assert_eq!(consumed.remaining, 0);
        assert_eq!(consumed.quantity, 50);

        let err = domain_err(h.ledger.consume_lot(supply.id, b.lot.id));
        assert!(matches!(err, DomainError::NotFound(_)));

        // The persisted supply matches what consume returned.
        let stored = h.catalog.get_supply(supply.id).unwrap();
        assert_eq!(stored, update.supply);
    }

    #[test]
    fn consume_with_floor_stock_leaves_everything_unchanged() {
        let h = harness();
        let supply = create(&h, "Omeprazol 20mg", 10, 5);
        let lot = h.ledger.register_lot(supply.id, new_lot("L1", 30, None)).unwrap().lot;

        let before_supply = h.catalog.get_supply(supply.id).unwrap();
        let before_lots = h.ledger.list_lots(supply.id).unwrap();

        let err = domain_err(h.ledger.consume_lot(supply.id, lot.id));
        assert!(matches!(err, DomainError::Precondition(_)));

        assert_eq!(h.catalog.get_supply(supply.id).unwrap(), before_supply);
        assert_eq!(h.ledger.list_lots(supply.id).unwrap(), before_lots);
    }

    #[test]
    fn lot_of_another_supply_is_not_found() {
        let h = harness();
        let first = create(&h, "Insulina", 0, 0);
        let second = create(&h, "Heparina", 0, 0);
        let lot = h.ledger.register_lot(first.id, new_lot("X", 5, None)).unwrap().lot;

        let err = domain_err(h.ledger.consume_lot(second.id, lot.id));
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[test]
    fn unknown_supply_is_not_found_everywhere() {
        let h = harness();
        let missing = SupplyId::new();

        assert!(matches!(
            domain_err(h.ledger.register_lot(missing, new_lot("X", 1, None))),
            DomainError::NotFound(_)
        ));
        assert!(matches!(domain_err(h.ledger.list_lots(missing)), DomainError::NotFound(_)));
        assert!(matches!(
            domain_err(h.ledger.consume_lot(missing, LotId::new())),
            DomainError::NotFound(_)
        ));
        assert!(matches!(domain_err(h.catalog.get_supply(missing)), DomainError::NotFound(_)));
        assert!(matches!(
            domain_err(h.alerts.supply_snapshot(missing)),
            DomainError::NotFound(_)
        ));
    }

    #[test]
    fn unknown_ids_leave_no_lock_entries() {
        let h = harness();
        for _ in 0..2_000 {
            let missing = SupplyId::new();
            assert!(h.ledger.consume_lot(missing, LotId::new()).is_err());
            assert!(h.ledger.adjust_stock(missing, -1).is_err());
            assert!(h.ledger.register_lot(missing, new_lot("X", 1, None)).is_err());
            assert!(h.catalog.set_active(missing, false).is_err());
        }
        assert_eq!(h.locks.tracked(), 0);

        // Known supplies do not keep entries between calls either.
        let supply = create(&h, "Metformina", 0, 0);
        let lot = h.ledger.register_lot(supply.id, new_lot("M1", 4, None)).unwrap().lot;
        h.ledger.consume_lot(supply.id, lot.id).unwrap();
        assert_eq!(h.locks.tracked(), 0);
    }

    #[test]
    fn register_lot_validation_surfaces_verbatim() {
        let h = harness();
        let supply = create(&h, "Gasas", 0, 0);

        let err = domain_err(h.ledger.register_lot(supply.id, new_lot("L", 0, None)));
        assert_eq!(err, DomainError::validation("lot quantity must be greater than 0"));
        let err = domain_err(h.ledger.register_lot(supply.id, new_lot("", 3, None)));
        assert_eq!(err, DomainError::validation("lot label cannot be empty"));

        assert!(h.ledger.list_lots(supply.id).unwrap().is_empty());
    }

    #[test]
    fn concurrent_consumes_on_one_supply_fold_in_exactly_one_lot() {
        let h = Arc::new(harness());
        let supply = create(h.as_ref(), "Ketorolaco", 0, 0);
        let lots: Vec<Lot> = (0..8)
            .map(|i| {
                h.ledger
                    .register_lot(supply.id, new_lot(&format!("L{i}"), 10 + i, None))
                    .unwrap()
                    .lot
            })
            .collect();

        let barrier = Arc::new(Barrier::new(lots.len()));
        let handles: Vec<_> = lots
            .iter()
            .map(|lot| {
                let h = h.clone();
                let barrier = barrier.clone();
                let lot_id = lot.id;
                let supply_id = supply.id;
                thread::spawn(move || {
                    barrier.wait();
                    h.ledger.consume_lot(supply_id, lot_id)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        for r in results.iter().filter(|r| r.is_err()) {
            let err = r.as_ref().unwrap_err();
            assert!(
                matches!(
                    err,
                    ServiceError::Domain(DomainError::Precondition(_))
                        | ServiceError::Domain(DomainError::Conflict(_))
                ),
                "unexpected error {err:?}"
            );
        }

        let stored_lots = h.ledger.list_lots(supply.id).unwrap();
        let exhausted: Vec<&Lot> = stored_lots.iter().filter(|l| l.remaining == 0).collect();
        assert_eq!(exhausted.len(), 1);
        let stored = h.catalog.get_supply(supply.id).unwrap();
        assert_eq!(stored.stock, exhausted[0].quantity);
        assert_eq!(stored, winners[0].supply);
    }

    #[test]
    fn concurrent_registrations_are_all_kept() {
        let h = Arc::new(harness());
        let supply = create(h.as_ref(), "Dextrosa 5%", 4, 0);

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let h = h.clone();
                let supply_id = supply.id;
                thread::spawn(move || h.ledger.register_lot(supply_id, new_lot(&format!("R{i}"), 1, None)))
            })
            .collect();
        for t in handles {
            t.join().unwrap().unwrap();
        }

        assert_eq!(h.ledger.list_lots(supply.id).unwrap().len(), 16);
        assert_eq!(h.catalog.get_supply(supply.id).unwrap().stock, 4);
    }

    /// Store wrapper that lets another writer slip in right before the next
    /// commit, as a second process sharing the database would.
    #[derive(Clone)]
    struct RacingStore {
        inner: Arc<InMemorySupplyStore>,
        interfere: Arc<std::sync::Mutex<bool>>,
    }

    impl SupplyStore for RacingStore {
        fn insert_supply(&self, supply: Supply) -> Result<Supply, StoreError> {
            self.inner.insert_supply(supply)
        }

        fn get_supply(&self, id: SupplyId) -> Result<Option<Supply>, StoreError> {
            self.inner.get_supply(id)
        }

        fn list_supplies(&self) -> Result<Vec<Supply>, StoreError> {
            self.inner.list_supplies()
        }

        fn lots_for(&self, id: SupplyId) -> Result<Vec<Lot>, StoreError> {
            self.inner.lots_for(id)
        }

        fn commit(&self, commit: Commit) -> Result<Supply, StoreError> {
            let mut interfere = self.interfere.lock().unwrap();
            if *interfere {
                *interfere = false;
                let mut other = self.inner.get_supply(commit.supply_id)?.unwrap();
                let expected = ExpectedVersion::Exact(other.version);
                other.stock += 1;
                let mut theirs = Commit::new(commit.supply_id, expected);
                theirs.supply = Some(other);
                self.inner.commit(theirs)?;
            }
            self.inner.commit(commit)
        }
    }

    #[test]
    fn stale_consume_loses_with_conflict_and_writes_nothing() {
        let store = RacingStore {
            inner: Arc::new(InMemorySupplyStore::new()),
            interfere: Arc::new(std::sync::Mutex::new(false)),
        };
        let h = harness_with(store.clone());
        let supply = create(&h, "Salbutamol", 0, 0);
        let lot = h.ledger.register_lot(supply.id, new_lot("S1", 20, None)).unwrap().lot;

        *store.interfere.lock().unwrap() = true;
        let err = domain_err(h.ledger.consume_lot(supply.id, lot.id));
        assert!(matches!(err, DomainError::Conflict(_)));

        // Only the interfering write landed.
        let stored = h.store.get_supply(supply.id).unwrap().unwrap();
        assert_eq!(stored.stock, 1);
        assert_eq!(h.ledger.list_lots(supply.id).unwrap()[0].remaining, 20);
    }

    #[test]
    fn dispensing_drives_low_stock_alerts() {
        let h = harness();
        let supply = create(&h, "Diclofenaco", 6, 5);
        assert!(h.alerts.low_stock_alerts().unwrap().is_empty());

        let update = h.ledger.adjust_stock(supply.id, -1).unwrap();
        assert_eq!(update.supply.stock, 5);
        assert!(update.alerts.low_stock);
        let low = h.alerts.low_stock_alerts().unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, supply.id);

        let err = domain_err(h.ledger.adjust_stock(supply.id, -6));
        assert!(matches!(err, DomainError::Precondition(_)));
        assert_eq!(h.catalog.get_supply(supply.id).unwrap().stock, 5);
    }

    #[test]
    fn expiring_and_expired_alerts_use_the_supply_date() {
        let h = harness();
        let soon = h
            .catalog
            .create_supply(NewSupply {
                name: "Vacuna".to_string(),
                stock: 100,
                expiration_date: Some(date(2025, 1, 20)),
                ..NewSupply::default()
            })
            .unwrap();
        h.catalog
            .create_supply(NewSupply {
                name: "Antiséptico".to_string(),
                stock: 100,
                expiration_date: Some(date(2025, 3, 1)),
                ..NewSupply::default()
            })
            .unwrap();
        let past = h
            .catalog
            .create_supply(NewSupply {
                name: "Vendas".to_string(),
                stock: 100,
                expiration_date: Some(date(2024, 12, 1)),
                ..NewSupply::default()
            })
            .unwrap();

        let expiring: Vec<SupplyId> = h
            .alerts
            .expiring_soon_alerts(Some(30))
            .unwrap()
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(expiring, vec![soon.id]);

        let expired: Vec<SupplyId> = h.alerts.expired_alerts().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(expired, vec![past.id]);

        assert_eq!(h.alerts.expiring_soon_alerts(Some(60)).unwrap().len(), 2);
        assert!(matches!(
            domain_err(h.alerts.expiring_soon_alerts(Some(-1))),
            DomainError::Validation(_)
        ));

        let summary = h.alerts.summary(None).unwrap();
        assert_eq!((summary.low_stock, summary.expiring_soon, summary.expired), (0, 1, 1));
    }

    #[test]
    fn retired_supplies_keep_lots_and_leave_alerts() {
        let h = harness();
        let supply = create(&h, "Clorfenamina", 0, 5);
        h.ledger.register_lot(supply.id, new_lot("C1", 12, None)).unwrap();
        assert_eq!(h.alerts.low_stock_alerts().unwrap().len(), 1);

        let retired = h.catalog.set_active(supply.id, false).unwrap();
        assert!(!retired.active);
        assert!(h.alerts.low_stock_alerts().unwrap().is_empty());
        assert_eq!(h.ledger.list_lots(supply.id).unwrap().len(), 1);
        assert_eq!(h.catalog.list_supplies(ActiveFilter::Active).unwrap().len(), 0);
        assert_eq!(h.catalog.list_supplies(ActiveFilter::Inactive).unwrap().len(), 1);

        let back = h.catalog.set_active(supply.id, true).unwrap();
        assert!(back.active);
        assert_eq!(back.version, retired.version + 1);
        assert_eq!(h.alerts.low_stock_alerts().unwrap().len(), 1);
    }

    #[test]
    fn catalog_update_is_partial_and_validated() {
        let h = harness();
        let supply = create(&h, "Lidocaína 2%", 3, 1);

        let updated = h
            .catalog
            .update_supply(
                supply.id,
                SupplyPatch {
                    unit_price: Some(Some(Decimal::new(2599, 2))),
                    storage_location: Some(Some("Vitrina 3".to_string())),
                    ..SupplyPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.unit_price, Some(Decimal::new(2599, 2)));
        assert_eq!(updated.storage_location.as_deref(), Some("Vitrina 3"));
        assert_eq!(updated.stock, 3);
        assert_eq!(updated.version, supply.version + 1);

        let err = domain_err(h.catalog.update_supply(
            supply.id,
            SupplyPatch {
                name: Some(" ".to_string()),
                ..SupplyPatch::default()
            },
        ));
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(h.catalog.get_supply(supply.id).unwrap(), updated);
    }

    #[test]
    fn listing_is_ordered_by_name() {
        let h = harness();
        create(&h, "Tramadol", 1, 0);
        create(&h, "Amikacina", 1, 0);
        create(&h, "Metamizol", 1, 0);

        let names: Vec<String> = h
            .catalog
            .list_supplies(ActiveFilter::All)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Amikacina", "Metamizol", "Tramadol"]);
    }
}
