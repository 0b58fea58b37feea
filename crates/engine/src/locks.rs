//! Per-wallet serialization of mutations.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Entries above this count trigger a sweep of unused locks.
const SWEEP_THRESHOLD: usize = 1024;

/// Async lock table keyed by wallet id.
///
/// Mutations of one wallet run one at a time, mutations of different wallets
/// do not wait for each other.
#[derive(Debug, Default)]
pub(crate) struct WalletLocks {
    locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}

impl WalletLocks {
    /// Wait for exclusive access to `wallet_id`.
    pub(crate) async fn acquire(&self, wallet_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            if locks.len() > SWEEP_THRESHOLD {
                // Only this table holds a reference to idle locks.
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(wallet_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Drop the entry of a deleted wallet.
    pub(crate) fn forget(&self, wallet_id: Uuid) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&wallet_id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_wallet_waits() {
        let locks = WalletLocks::default();
        let wallet = Uuid::new_v4();

        let guard = locks.acquire(wallet).await;
        let second = tokio::time::timeout(Duration::from_millis(20), locks.acquire(wallet)).await;
        assert!(second.is_err());

        drop(guard);
        let third = tokio::time::timeout(Duration::from_millis(20), locks.acquire(wallet)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn other_wallets_do_not_wait() {
        let locks = WalletLocks::default();
        let _first = locks.acquire(Uuid::new_v4()).await;
        let other = tokio::time::timeout(
            Duration::from_millis(20),
            locks.acquire(Uuid::new_v4()),
        )
        .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn forget_removes_entry() {
        let locks = WalletLocks::default();
        let wallet = Uuid::new_v4();
        drop(locks.acquire(wallet).await);
        assert_eq!(locks.len(), 1);
        locks.forget(wallet);
        assert_eq!(locks.len(), 0);
    }
}
