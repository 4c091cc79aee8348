//! Per-supply mutual exclusion.
//!
//! Each supply gets its own reader/writer lock. Writers (consume, floor-stock
//! adjustments, catalog updates) exclude everything else on that supply;
//! readers (lot registration, which only appends) run alongside each other.
//! Distinct supplies never contend, apart from the brief registry lookup.
//!
//! A registry entry lives only while some caller holds or waits on it, so ids
//! that are never seen again (including ones for supplies that do not exist)
//! leave nothing behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use pharmstock_core::SupplyId;

type Registry = HashMap<SupplyId, Arc<RwLock<()>>>;

#[derive(Debug, Default)]
pub struct SupplyLocks {
    registry: Mutex<Registry>,
}

impl SupplyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // The registry holds no invariants a panicking holder could break.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lease(&self, supply_id: SupplyId) -> Lease<'_> {
        let lock = self.registry().entry(supply_id).or_default().clone();
        Lease {
            locks: self,
            supply_id,
            lock,
        }
    }

    /// Run `f` while holding the supply's exclusive (write) guard.
    pub fn exclusive<T>(&self, supply_id: SupplyId, f: impl FnOnce() -> T) -> T {
        let lease = self.lease(supply_id);
        let _guard = lease.lock.write().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    /// Run `f` while holding the supply's shared (read) guard.
    pub fn shared<T>(&self, supply_id: SupplyId, f: impl FnOnce() -> T) -> T {
        let lease = self.lease(supply_id);
        let _guard = lease.lock.read().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.registry().len()
    }
}

/// One caller's claim on a supply's lock. Dropping the last claim removes
/// the registry entry.
struct Lease<'a> {
    locks: &'a SupplyLocks,
    supply_id: SupplyId,
    lock: Arc<RwLock<()>>,
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        // Clones are only handed out under the registry mutex, so a count of
        // two (the registry's and ours) seen here means nobody else holds it.
        let mut registry = self.locks.registry();
        let idle = registry.get(&self.supply_id).is_some_and(|entry| {
            Arc::ptr_eq(entry, &self.lock) && Arc::strong_count(&self.lock) == 2
        });
        if idle {
            registry.remove(&self.supply_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn exclusive_sections_on_one_supply_do_not_overlap() {
        let locks = Arc::new(SupplyLocks::new());
        let supply_id = SupplyId::new();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    locks.exclusive(supply_id, || {
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_seen.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_millis(2));
                        inside.fetch_sub(1, Ordering::SeqCst);
                    })
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn shared_sections_run_together() {
        let locks = Arc::new(SupplyLocks::new());
        let supply_id = SupplyId::new();
        let barrier = Arc::new(Barrier::new(2));

        // Both readers must be inside at once for the barrier to release.
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let locks = locks.clone();
                let barrier = barrier.clone();
                thread::spawn(move || locks.shared(supply_id, || barrier.wait()))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn different_supplies_do_not_block_each_other() {
        let locks = Arc::new(SupplyLocks::new());
        let a = SupplyId::new();
        let b = SupplyId::new();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [a, b]
            .into_iter()
            .map(|id| {
                let locks = locks.clone();
                let barrier = barrier.clone();
                thread::spawn(move || locks.exclusive(id, || barrier.wait()))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn registry_forgets_ids_once_released() {
        let locks = SupplyLocks::new();
        for _ in 0..1_000 {
            locks.exclusive(SupplyId::new(), || ());
            locks.shared(SupplyId::new(), || ());
        }
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn entry_survives_while_another_caller_waits() {
        let locks = Arc::new(SupplyLocks::new());
        let supply_id = SupplyId::new();
        let entered = Arc::new(Barrier::new(2));
        let counter = Arc::new(AtomicUsize::new(0));

        let holder = {
            let locks = locks.clone();
            let entered = entered.clone();
            let counter = counter.clone();
            thread::spawn(move || {
                locks.exclusive(supply_id, || {
                    entered.wait();
                    thread::sleep(Duration::from_millis(20));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
            })
        };
        entered.wait();
        // Blocks until the holder is done; the entry must be the same lock.
        locks.exclusive(supply_id, || {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        });
        holder.join().unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn panicking_section_still_releases_its_entry() {
        let locks = Arc::new(SupplyLocks::new());
        let supply_id = SupplyId::new();
        let worker = {
            let locks = locks.clone();
            thread::spawn(move || {
                let _: () = locks.exclusive(supply_id, || panic!("boom"));
            })
        };
        assert!(worker.join().is_err());
        assert_eq!(locks.tracked(), 0);
        // The poisoned lock is gone; the next caller gets a fresh one.
        assert_eq!(locks.exclusive(supply_id, || 7), 7);
    }
}
