//! Persistence seam of the engine.
//!
//! Every engine operation opens one [`StoreTx`] through [`Store::begin`],
//! performs its reads and writes on it and commits. A transaction dropped
//! without [`StoreTx::commit`] leaves the store untouched, which is what makes
//! a failed, cancelled or timed out operation side-effect free.
//!
//! Two backends implement the traits:
//!
//! - [`MemoryStore`]: process memory, used by tests and the `memory` database
//!   setting;
//! - [`SeaStore`]: sea-orm over a relational database.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{Amount, Category, Currency, Flow, ResultEngine, User, Wallet};

mod memory;
mod sea;

pub use memory::MemoryStore;
pub use sea::SeaStore;

#[async_trait]
pub trait Store: Send + Sync {
    /// Start a transaction.
    async fn begin(&self) -> ResultEngine<Box<dyn StoreTx>>;
}

/// One atomic unit of work on a [`Store`].
#[async_trait]
pub trait StoreTx: Send {
    async fn insert_user(&mut self, user: &User) -> ResultEngine<()>;
    async fn user(&mut self, user_id: Uuid) -> ResultEngine<Option<User>>;
    async fn user_by_username(&mut self, username: &str) -> ResultEngine<Option<User>>;

    /// Insert the wallet row together with its owners. Balances are not
    /// written.
    async fn insert_wallet(&mut self, wallet: &Wallet) -> ResultEngine<()>;
    /// Wallet with owners and balances.
    async fn wallet(&mut self, wallet_id: Uuid) -> ResultEngine<Option<Wallet>>;
    /// Wallets where `user_id` is an owner, sorted by name.
    async fn wallets_owned_by(&mut self, user_id: Uuid) -> ResultEngine<Vec<Wallet>>;
    async fn rename_wallet(&mut self, wallet_id: Uuid, name: &str) -> ResultEngine<()>;
    /// Remove the wallet row only.
    async fn delete_wallet(&mut self, wallet_id: Uuid) -> ResultEngine<()>;

    async fn is_owner(&mut self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<bool>;
    /// Add an owner link; adding an existing owner is a no-op.
    async fn add_owner(&mut self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<()>;
    async fn delete_owners(&mut self, wallet_id: Uuid) -> ResultEngine<()>;

    /// Insert or overwrite the balance of `(wallet, currency)`.
    async fn put_balance(
        &mut self,
        wallet_id: Uuid,
        currency: Currency,
        balance: Amount,
    ) -> ResultEngine<()>;
    async fn delete_balances(&mut self, wallet_id: Uuid) -> ResultEngine<()>;

    async fn insert_flow(&mut self, flow: &Flow) -> ResultEngine<()>;
    async fn flow(&mut self, flow_id: Uuid) -> ResultEngine<Option<Flow>>;
    /// Overwrite every mutable field of an existing flow.
    async fn update_flow(&mut self, flow: &Flow) -> ResultEngine<()>;
    async fn delete_flow(&mut self, flow_id: Uuid) -> ResultEngine<()>;
    /// Flows of the given wallets, newest first.
    async fn flows_for_wallets(&mut self, wallet_ids: &[Uuid]) -> ResultEngine<Vec<Flow>>;
    async fn delete_flows(&mut self, wallet_id: Uuid) -> ResultEngine<()>;

    async fn insert_category(&mut self, category: &Category) -> ResultEngine<()>;
    async fn category(&mut self, category_id: Uuid) -> ResultEngine<Option<Category>>;
    async fn category_by_name(&mut self, name: &str) -> ResultEngine<Option<Category>>;
    async fn update_category(&mut self, category: &Category) -> ResultEngine<()>;
    /// All categories, sorted by name.
    async fn categories(&mut self) -> ResultEngine<Vec<Category>>;

    /// Make every write of the transaction visible.
    async fn commit(self: Box<Self>) -> ResultEngine<()>;
}
