//! Per-payout exclusive locks
//!
//! At most one warm-up or commit runs per payout id at any instant. Different
//! ids never contend: each id gets its own mutex, created on first use and
//! dropped once the last holder releases it.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use super::error::PayoutError;
use super::types::PayoutId;

type LockMap = DashMap<PayoutId, Arc<Mutex<()>>>;

/// Drop the registry entry for `payout_id` once no holder or waiter references it
///
/// Waiters clone the Arc under the shard lock, so a count of 1 means nobody waits.
fn release_idle(locks: &LockMap, payout_id: &PayoutId) {
    locks.remove_if(payout_id, |_, mutex| Arc::strong_count(mutex) == 1);
}

/// Registry of per-payout mutexes
pub struct PayoutLocks {
    locks: Arc<LockMap>,
    timeout: Duration,
}

impl PayoutLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Acquire exclusive access to `payout_id`, waiting at most the configured timeout
    ///
    /// The lock is released when the returned guard drops, on every exit path.
    pub async fn acquire(&self, payout_id: PayoutId) -> Result<PayoutLockGuard, PayoutError> {
        let mutex = self
            .locks
            .entry(payout_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        // The lock future owns the cloned Arc; it is gone once this statement ends.
        let acquired = tokio::time::timeout(self.timeout, mutex.lock_owned()).await;
        match acquired {
            Ok(guard) => Ok(PayoutLockGuard {
                payout_id,
                guard: Some(guard),
                locks: self.locks.clone(),
            }),
            Err(_) => {
                // The holder may have released while this waiter still held its clone.
                release_idle(&self.locks, &payout_id);

                let waited_ms = self.timeout.as_millis() as u64;
                warn!(payout_id = %payout_id, waited_ms, "Payout lock timeout");
                Err(PayoutError::LockTimeout {
                    payout_id,
                    waited_ms,
                })
            }
        }
    }

    /// Number of ids with a live mutex
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held lock on one payout id
pub struct PayoutLockGuard {
    payout_id: PayoutId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<LockMap>,
}

impl PayoutLockGuard {
    pub fn payout_id(&self) -> PayoutId {
        self.payout_id
    }
}

impl Drop for PayoutLockGuard {
    fn drop(&mut self) {
        // Release first so the registry's Arc may be the last one left.
        self.guard.take();
        release_idle(&self.locks, &self.payout_id);
    }
}
