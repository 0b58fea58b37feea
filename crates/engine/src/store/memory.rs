use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, StoreTx};
use crate::{Amount, Category, Currency, EngineError, Flow, ResultEngine, User, Wallet};

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    wallets: HashMap<Uuid, Wallet>,
    flows: HashMap<Uuid, Flow>,
    /// Flow ids per wallet.
    wallet_flows: HashMap<Uuid, BTreeSet<Uuid>>,
    categories: HashMap<Uuid, Category>,
}

impl MemoryState {
    fn put_flow(&mut self, flow: Flow) -> Option<Flow> {
        self.wallet_flows
            .entry(flow.wallet_id)
            .or_default()
            .insert(flow.id);
        self.flows.insert(flow.id, flow)
    }

    fn remove_flow(&mut self, flow_id: Uuid) -> Option<Flow> {
        let flow = self.flows.remove(&flow_id)?;
        if let Some(ids) = self.wallet_flows.get_mut(&flow.wallet_id) {
            ids.remove(&flow_id);
            if ids.is_empty() {
                self.wallet_flows.remove(&flow.wallet_id);
            }
        }
        Some(flow)
    }

    fn undo(&mut self, entry: Undo) {
        match entry {
            Undo::User(id, previous) => restore(&mut self.users, id, previous),
            Undo::Wallet(id, previous) => restore(&mut self.wallets, id, previous),
            Undo::Flow(id, previous) => {
                self.remove_flow(id);
                if let Some(flow) = previous {
                    self.put_flow(flow);
                }
            }
            Undo::Category(id, previous) => restore(&mut self.categories, id, previous),
        }
    }
}

/// Value an entry had before a transaction touched it.
enum Undo {
    User(Uuid, Option<User>),
    Wallet(Uuid, Option<Wallet>),
    Flow(Uuid, Option<Flow>),
    Category(Uuid, Option<Category>),
}

fn restore<T>(map: &mut HashMap<Uuid, T>, id: Uuid, previous: Option<T>) {
    match previous {
        Some(value) => {
            map.insert(id, value);
        }
        None => {
            map.remove(&id);
        }
    }
}

/// In-process store.
///
/// A transaction holds the store lock for its whole life and writes to the
/// shared state in place, logging the previous value of every entry it
/// touches. Dropping it without commit replays the log backwards.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> ResultEngine<Box<dyn StoreTx>> {
        let state = Arc::clone(&self.state).lock_owned().await;
        Ok(Box::new(MemoryTx {
            state,
            undo: Vec::new(),
        }))
    }
}

struct MemoryTx {
    state: OwnedMutexGuard<MemoryState>,
    undo: Vec<Undo>,
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        while let Some(entry) = self.undo.pop() {
            self.state.undo(entry);
        }
    }
}

impl MemoryTx {
    fn wallet_mut(&mut self, wallet_id: Uuid) -> ResultEngine<&mut Wallet> {
        let wallet = self
            .state
            .wallets
            .get_mut(&wallet_id)
            .ok_or_else(|| EngineError::KeyNotFound("wallet not exists".to_string()))?;
        self.undo.push(Undo::Wallet(wallet_id, Some(wallet.clone())));
        Ok(wallet)
    }

    fn put_flow(&mut self, flow: Flow) {
        let id = flow.id;
        let previous = self.state.put_flow(flow);
        self.undo.push(Undo::Flow(id, previous));
    }

    fn remove_flow(&mut self, flow_id: Uuid) {
        if let Some(previous) = self.state.remove_flow(flow_id) {
            self.undo.push(Undo::Flow(flow_id, Some(previous)));
        }
    }
}

fn newest_first(flows: &mut [Flow]) {
    flows.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn insert_user(&mut self, user: &User) -> ResultEngine<()> {
        let previous = self.state.users.insert(user.id, user.clone());
        self.undo.push(Undo::User(user.id, previous));
        Ok(())
    }

    async fn user(&mut self, user_id: Uuid) -> ResultEngine<Option<User>> {
        Ok(self.state.users.get(&user_id).cloned())
    }

    async fn user_by_username(&mut self, username: &str) -> ResultEngine<Option<User>> {
        Ok(self
            .state
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert_wallet(&mut self, wallet: &Wallet) -> ResultEngine<()> {
        let mut stored = wallet.clone();
        stored.balances.clear();
        let previous = self.state.wallets.insert(wallet.id, stored);
        self.undo.push(Undo::Wallet(wallet.id, previous));
        Ok(())
    }

    async fn wallet(&mut self, wallet_id: Uuid) -> ResultEngine<Option<Wallet>> {
        Ok(self.state.wallets.get(&wallet_id).cloned())
    }

    async fn wallets_owned_by(&mut self, user_id: Uuid) -> ResultEngine<Vec<Wallet>> {
        let mut wallets: Vec<Wallet> = self
            .state
            .wallets
            .values()
            .filter(|wallet| wallet.is_owner(user_id))
            .cloned()
            .collect();
        wallets.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(wallets)
    }

    async fn rename_wallet(&mut self, wallet_id: Uuid, name: &str) -> ResultEngine<()> {
        self.wallet_mut(wallet_id)?.name = name.to_string();
        Ok(())
    }

    async fn delete_wallet(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        if let Some(previous) = self.state.wallets.remove(&wallet_id) {
            self.undo.push(Undo::Wallet(wallet_id, Some(previous)));
        }
        Ok(())
    }

    async fn is_owner(&mut self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<bool> {
        Ok(self
            .state
            .wallets
            .get(&wallet_id)
            .is_some_and(|wallet| wallet.is_owner(user_id)))
    }

    async fn add_owner(&mut self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<()> {
        self.wallet_mut(wallet_id)?.owners.insert(user_id);
        Ok(())
    }

    async fn delete_owners(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        if let Ok(wallet) = self.wallet_mut(wallet_id) {
            wallet.owners.clear();
        }
        Ok(())
    }

    async fn put_balance(
        &mut self,
        wallet_id: Uuid,
        currency: Currency,
        balance: Amount,
    ) -> ResultEngine<()> {
        self.wallet_mut(wallet_id)?
            .balances
            .insert(currency, balance);
        Ok(())
    }

    async fn delete_balances(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        if let Ok(wallet) = self.wallet_mut(wallet_id) {
            wallet.balances.clear();
        }
        Ok(())
    }

    async fn insert_flow(&mut self, flow: &Flow) -> ResultEngine<()> {
        self.put_flow(flow.clone());
        Ok(())
    }

    async fn flow(&mut self, flow_id: Uuid) -> ResultEngine<Option<Flow>> {
        Ok(self.state.flows.get(&flow_id).cloned())
    }

    async fn update_flow(&mut self, flow: &Flow) -> ResultEngine<()> {
        if !self.state.flows.contains_key(&flow.id) {
            return Err(EngineError::KeyNotFound("flow not exists".to_string()));
        }
        self.put_flow(flow.clone());
        Ok(())
    }

    async fn delete_flow(&mut self, flow_id: Uuid) -> ResultEngine<()> {
        self.remove_flow(flow_id);
        Ok(())
    }

    async fn flows_for_wallets(&mut self, wallet_ids: &[Uuid]) -> ResultEngine<Vec<Flow>> {
        let state = &*self.state;
        let mut flows: Vec<Flow> = wallet_ids
            .iter()
            .filter_map(|wallet_id| state.wallet_flows.get(wallet_id))
            .flatten()
            .filter_map(|flow_id| state.flows.get(flow_id))
            .cloned()
            .collect();
        newest_first(&mut flows);
        Ok(flows)
    }

    async fn delete_flows(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        let ids: Vec<Uuid> = self
            .state
            .wallet_flows
            .get(&wallet_id)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        for flow_id in ids {
            self.remove_flow(flow_id);
        }
        Ok(())
    }

    async fn insert_category(&mut self, category: &Category) -> ResultEngine<()> {
        let previous = self.state.categories.insert(category.id, category.clone());
        self.undo.push(Undo::Category(category.id, previous));
        Ok(())
    }

    async fn category(&mut self, category_id: Uuid) -> ResultEngine<Option<Category>> {
        Ok(self.state.categories.get(&category_id).cloned())
    }

    async fn category_by_name(&mut self, name: &str) -> ResultEngine<Option<Category>> {
        Ok(self
            .state
            .categories
            .values()
            .find(|category| category.name == name)
            .cloned())
    }

    async fn update_category(&mut self, category: &Category) -> ResultEngine<()> {
        let Some(stored) = self.state.categories.get_mut(&category.id) else {
            return Err(EngineError::KeyNotFound("category not exists".to_string()));
        };
        let previous = Category {
            id: stored.id,
            name: std::mem::replace(&mut stored.name, category.name.clone()),
        };
        self.undo.push(Undo::Category(category.id, Some(previous)));
        Ok(())
    }

    async fn categories(&mut self) -> ResultEngine<Vec<Category>> {
        let mut categories: Vec<Category> = self.state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn commit(mut self: Box<Self>) -> ResultEngine<()> {
        self.undo.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[tokio::test]
    async fn uncommitted_writes_are_discarded() {
        let store = MemoryStore::new();
        let user = User::new("alice".to_string(), "pw".to_string());

        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        assert!(tx.user(user.id).await.unwrap().is_some());
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.user(user.id).await.unwrap(), None);
        tx.insert_user(&user).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.user_by_username("alice").await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn dropped_transaction_restores_touched_entries() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let wallet = Wallet::new("Home".to_string(), owner);
        let category = Category::new("Food".to_string());
        let flow = Flow {
            id: Uuid::new_v4(),
            wallet_id: wallet.id,
            amount: Amount::new(100),
            currency: Currency::EUR,
            category_id: category.id,
            description: String::new(),
            created_at: chrono::Utc::now(),
            operator_id: owner,
        };

        let mut tx = store.begin().await.unwrap();
        tx.insert_wallet(&wallet).await.unwrap();
        tx.insert_category(&category).await.unwrap();
        tx.put_balance(wallet.id, Currency::EUR, Amount::new(100))
            .await
            .unwrap();
        tx.insert_flow(&flow).await.unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.put_balance(wallet.id, Currency::EUR, Amount::new(-5))
            .await
            .unwrap();
        tx.put_balance(wallet.id, Currency::USD, Amount::new(7))
            .await
            .unwrap();
        tx.rename_wallet(wallet.id, "Renamed").await.unwrap();
        tx.update_category(&Category {
            id: category.id,
            name: "Rent".to_string(),
        })
        .await
        .unwrap();
        tx.delete_flows(wallet.id).await.unwrap();
        tx.insert_flow(&Flow {
            id: Uuid::new_v4(),
            ..flow.clone()
        })
        .await
        .unwrap();
        drop(tx);

        let mut tx = store.begin().await.unwrap();
        let stored = tx.wallet(wallet.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Home");
        assert_eq!(
            stored.balances,
            BTreeMap::from([(Currency::EUR, Amount::new(100))])
        );
        assert_eq!(tx.category(category.id).await.unwrap(), Some(category));
        assert_eq!(tx.flows_for_wallets(&[wallet.id]).await.unwrap(), vec![flow]);
    }

    #[tokio::test]
    async fn balances_require_a_wallet() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx
            .put_balance(Uuid::new_v4(), Currency::USD, Amount::new(1))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::KeyNotFound("wallet not exists".to_string()));
    }
}
