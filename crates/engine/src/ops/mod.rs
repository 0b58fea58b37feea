use std::{collections::BTreeMap, fmt, future::Future, sync::Arc, time::Duration};

use tokio::sync::Mutex;

use crate::{
    Amount, Currency, EngineError, ResultEngine,
    locks::WalletLocks,
    rates::{RateTable, Rates},
    store::{MemoryStore, Store},
};

/// Balances of one wallet after a mutation.
pub type Balances = BTreeMap<Currency, Amount>;

/// Default bound on a whole store transaction.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a block inside a store transaction, committing on success and
/// dropping (rolling back) on error. The whole unit is bounded by the store
/// timeout.
///
/// `lock <wallet id>` serializes the block with other mutations of the same
/// wallet; `catalog` serializes it with other user and category writes. Both
/// locks are taken before the transaction starts.
macro_rules! with_tx {
    ($engine:expr, |$tx:ident| $body:expr) => {{
        let engine: &$crate::Engine = $engine;
        engine
            .run(async {
                let mut $tx = engine.store.begin().await?;
                let result: $crate::ResultEngine<_> = $body;
                let value = result?;
                $tx.commit().await?;
                Ok::<_, $crate::EngineError>(value)
            })
            .await
    }};
    ($engine:expr, lock $wallet_id:expr, |$tx:ident| $body:expr) => {{
        let engine: &$crate::Engine = $engine;
        let wallet_id: uuid::Uuid = $wallet_id;
        engine
            .run(async {
                let _guard = engine.locks.acquire(wallet_id).await;
                let mut $tx = engine.store.begin().await?;
                let result: $crate::ResultEngine<_> = $body;
                let value = result?;
                $tx.commit().await?;
                Ok::<_, $crate::EngineError>(value)
            })
            .await
    }};
    ($engine:expr, catalog, |$tx:ident| $body:expr) => {{
        let engine: &$crate::Engine = $engine;
        engine
            .run(async {
                let _guard = engine.catalog.lock().await;
                let mut $tx = engine.store.begin().await?;
                let result: $crate::ResultEngine<_> = $body;
                let value = result?;
                $tx.commit().await?;
                Ok::<_, $crate::EngineError>(value)
            })
            .await
    }};
}

pub(crate) use with_tx;

mod access;
mod categories;
mod flows;
mod memberships;
mod summary;
mod users;
mod wallets;

pub struct Engine {
    store: Arc<dyn Store>,
    rates: Arc<Rates>,
    locks: WalletLocks,
    /// Serializes writes to the global user and category registries.
    catalog: Mutex<()>,
    store_timeout: Duration,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("rates_version", &self.rates.current().version())
            .field("store_timeout", &self.store_timeout)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The rate table holder the engine converts with.
    #[must_use]
    pub fn rates(&self) -> &Arc<Rates> {
        &self.rates
    }

    /// Bound `work` by the store timeout. A future that runs out of time is
    /// dropped, which rolls back its transaction.
    async fn run<T>(&self, work: impl Future<Output = ResultEngine<T>>) -> ResultEngine<T> {
        match tokio::time::timeout(self.store_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(timeout = ?self.store_timeout, "store operation timed out");
                Err(EngineError::Timeout(self.store_timeout))
            }
        }
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    store: Arc<dyn Store>,
    rates: Arc<Rates>,
    store_timeout: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            rates: Arc::new(Rates::new(RateTable::reference_only(Currency::USD))),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl EngineBuilder {
    /// Pass the store backend (in memory by default).
    pub fn store(mut self, store: impl Store + 'static) -> EngineBuilder {
        self.store = Arc::new(store);
        self
    }

    /// Share a rate holder with the refresher task.
    pub fn rates(mut self, rates: Arc<Rates>) -> EngineBuilder {
        self.rates = rates;
        self
    }

    pub fn store_timeout(mut self, store_timeout: Duration) -> EngineBuilder {
        self.store_timeout = store_timeout;
        self
    }

    /// Construct `Engine`
    pub fn build(self) -> Engine {
        Engine {
            store: self.store,
            rates: self.rates,
            locks: WalletLocks::default(),
            catalog: Mutex::new(()),
            store_timeout: self.store_timeout,
        }
    }
}
