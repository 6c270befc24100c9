use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use futures::lock::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::model::leave_type_key;

type LedgerKey = (u64, String);

/// Async locks keyed by `(employee_id, leave type)`.
///
/// Anything that reads a balance and writes it back holds the matching guard
/// across the whole read-check-write sequence.
#[derive(Default)]
pub struct LedgerLocks {
    slots: Mutex<HashMap<LedgerKey, Arc<AsyncMutex<()>>>>,
}

impl LedgerLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, employee_id: u64, leave_type: &str) -> Arc<AsyncMutex<()>> {
        let key = (employee_id, leave_type_key(leave_type));
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // a slot only the map references has no holder and no waiter
        slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        slots.entry(key).or_default().clone()
    }

    pub async fn acquire(&self, employee_id: u64, leave_type: &str) -> OwnedMutexGuard<()> {
        self.slot(employee_id, leave_type).lock_owned().await
    }

    /// Locks every listed type for one employee, in a fixed order so two
    /// callers locking overlapping sets cannot deadlock.
    pub async fn acquire_all<'a, I>(&self, employee_id: u64, leave_types: I) -> Vec<OwnedMutexGuard<()>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut keys: Vec<String> = leave_types
            .into_iter()
            .map(leave_type_key)
            .collect();
        keys.sort();
        keys.dedup();

        let mut guards = Vec::with_capacity(keys.len());
        for key in keys {
            guards.push(self.acquire(employee_id, &key).await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn same_key_is_exclusive_across_case() {
        let locks = LedgerLocks::new();
        let guard = locks.acquire(7, "Annual").await;

        assert!(locks.slot(7, "annual").try_lock().is_none());
        assert!(locks.slot(7, "sick").try_lock().is_some());
        assert!(locks.slot(8, "annual").try_lock().is_some());

        drop(guard);
        assert!(locks.slot(7, "ANNUAL").try_lock().is_some());
    }

    #[actix_web::test]
    async fn released_slots_are_dropped() {
        let locks = LedgerLocks::new();
        for employee_id in 1..=50 {
            drop(locks.acquire(employee_id, "annual").await);
        }

        let held = locks.acquire(99, "sick").await;
        let _other = locks.acquire(98, "sick").await;
        assert_eq!(locks.slots.lock().expect("slots").len(), 2);

        drop(held);
        drop(locks.acquire(1, "annual").await);
        assert_eq!(locks.slots.lock().expect("slots").len(), 2);
    }

    #[actix_web::test]
    async fn acquire_all_dedups_types() {
        let locks = LedgerLocks::new();
        let guards = locks.acquire_all(1, ["sick", "annual", "Sick"]).await;
        assert_eq!(guards.len(), 2);
    }
}
