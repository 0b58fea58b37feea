use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use sea_orm::{
    ActiveValue, DatabaseConnection, DatabaseTransaction, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*,
};
use uuid::Uuid;

use super::{Store, StoreTx};
use crate::{
    Amount, Category, Currency, Flow, ResultEngine, User, Wallet, categories, flows, users,
    util::{model_currency, parse_uuid},
    wallet_balances, wallet_owners, wallets,
};

/// Relational store on top of a sea-orm connection.
///
/// The schema is the one created by the `migration` crate.
#[derive(Clone, Debug)]
pub struct SeaStore {
    database: DatabaseConnection,
}

impl SeaStore {
    #[must_use]
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }
}

#[async_trait]
impl Store for SeaStore {
    async fn begin(&self) -> ResultEngine<Box<dyn StoreTx>> {
        let db_tx = self.database.begin().await?;
        Ok(Box::new(SeaTx { db_tx }))
    }
}

/// Rolls back on drop unless committed.
struct SeaTx {
    db_tx: DatabaseTransaction,
}

impl SeaTx {
    /// Load owners and balances of the given wallet rows.
    async fn hydrate(&self, models: Vec<wallets::Model>) -> ResultEngine<Vec<Wallet>> {
        let ids: Vec<String> = models.iter().map(|model| model.id.clone()).collect();

        let mut owners: HashMap<String, BTreeSet<Uuid>> = HashMap::new();
        for link in wallet_owners::Entity::find()
            .filter(wallet_owners::Column::WalletId.is_in(ids.clone()))
            .all(&self.db_tx)
            .await?
        {
            owners
                .entry(link.wallet_id)
                .or_default()
                .insert(parse_uuid(&link.user_id, "user")?);
        }

        let mut balances: HashMap<String, BTreeMap<Currency, Amount>> = HashMap::new();
        for row in wallet_balances::Entity::find()
            .filter(wallet_balances::Column::WalletId.is_in(ids))
            .all(&self.db_tx)
            .await?
        {
            balances
                .entry(row.wallet_id)
                .or_default()
                .insert(model_currency(&row.currency)?, Amount::new(row.balance_minor));
        }

        models
            .into_iter()
            .map(|model| {
                Ok(Wallet {
                    id: parse_uuid(&model.id, "wallet")?,
                    owners: owners.remove(&model.id).unwrap_or_default(),
                    balances: balances.remove(&model.id).unwrap_or_default(),
                    name: model.name,
                })
            })
            .collect()
    }
}

#[async_trait]
impl StoreTx for SeaTx {
    async fn insert_user(&mut self, user: &User) -> ResultEngine<()> {
        users::ActiveModel::from(user).insert(&self.db_tx).await?;
        Ok(())
    }

    async fn user(&mut self, user_id: Uuid) -> ResultEngine<Option<User>> {
        users::Entity::find_by_id(user_id.to_string())
            .one(&self.db_tx)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn user_by_username(&mut self, username: &str) -> ResultEngine<Option<User>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db_tx)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn insert_wallet(&mut self, wallet: &Wallet) -> ResultEngine<()> {
        wallets::ActiveModel::from(wallet).insert(&self.db_tx).await?;
        for owner in &wallet.owners {
            self.add_owner(wallet.id, *owner).await?;
        }
        Ok(())
    }

    async fn wallet(&mut self, wallet_id: Uuid) -> ResultEngine<Option<Wallet>> {
        let Some(model) = wallets::Entity::find_by_id(wallet_id.to_string())
            .one(&self.db_tx)
            .await?
        else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    async fn wallets_owned_by(&mut self, user_id: Uuid) -> ResultEngine<Vec<Wallet>> {
        let wallet_ids: Vec<String> = wallet_owners::Entity::find()
            .filter(wallet_owners::Column::UserId.eq(user_id.to_string()))
            .all(&self.db_tx)
            .await?
            .into_iter()
            .map(|link| link.wallet_id)
            .collect();
        if wallet_ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = wallets::Entity::find()
            .filter(wallets::Column::Id.is_in(wallet_ids))
            .order_by_asc(wallets::Column::Name)
            .order_by_asc(wallets::Column::Id)
            .all(&self.db_tx)
            .await?;
        self.hydrate(models).await
    }

    async fn rename_wallet(&mut self, wallet_id: Uuid, name: &str) -> ResultEngine<()> {
        let model = wallets::ActiveModel {
            id: ActiveValue::Unchanged(wallet_id.to_string()),
            name: ActiveValue::Set(name.to_string()),
        };
        model.update(&self.db_tx).await?;
        Ok(())
    }

    async fn delete_wallet(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        wallets::Entity::delete_by_id(wallet_id.to_string())
            .exec(&self.db_tx)
            .await?;
        Ok(())
    }

    async fn is_owner(&mut self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<bool> {
        Ok(
            wallet_owners::Entity::find_by_id((wallet_id.to_string(), user_id.to_string()))
                .one(&self.db_tx)
                .await?
                .is_some(),
        )
    }

    async fn add_owner(&mut self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<()> {
        if self.is_owner(wallet_id, user_id).await? {
            return Ok(());
        }
        wallet_owners::ActiveModel {
            wallet_id: ActiveValue::Set(wallet_id.to_string()),
            user_id: ActiveValue::Set(user_id.to_string()),
        }
        .insert(&self.db_tx)
        .await?;
        Ok(())
    }

    async fn delete_owners(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        wallet_owners::Entity::delete_many()
            .filter(wallet_owners::Column::WalletId.eq(wallet_id.to_string()))
            .exec(&self.db_tx)
            .await?;
        Ok(())
    }

    async fn put_balance(
        &mut self,
        wallet_id: Uuid,
        currency: Currency,
        balance: Amount,
    ) -> ResultEngine<()> {
        let key = (wallet_id.to_string(), currency.code().to_string());
        let existing = wallet_balances::Entity::find_by_id(key.clone())
            .one(&self.db_tx)
            .await?;
        let model = wallet_balances::ActiveModel {
            wallet_id: ActiveValue::Unchanged(key.0),
            currency: ActiveValue::Unchanged(key.1),
            balance_minor: ActiveValue::Set(balance.minor()),
        };
        if existing.is_some() {
            model.update(&self.db_tx).await?;
        } else {
            wallet_balances::Entity::insert(model)
                .exec_without_returning(&self.db_tx)
                .await?;
        }
        Ok(())
    }

    async fn delete_balances(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        wallet_balances::Entity::delete_many()
            .filter(wallet_balances::Column::WalletId.eq(wallet_id.to_string()))
            .exec(&self.db_tx)
            .await?;
        Ok(())
    }

    async fn insert_flow(&mut self, flow: &Flow) -> ResultEngine<()> {
        flows::ActiveModel::from(flow).insert(&self.db_tx).await?;
        Ok(())
    }

    async fn flow(&mut self, flow_id: Uuid) -> ResultEngine<Option<Flow>> {
        flows::Entity::find_by_id(flow_id.to_string())
            .one(&self.db_tx)
            .await?
            .map(Flow::try_from)
            .transpose()
    }

    async fn update_flow(&mut self, flow: &Flow) -> ResultEngine<()> {
        let mut model = flows::ActiveModel::from(flow);
        model.id = ActiveValue::Unchanged(flow.id.to_string());
        model.wallet_id = ActiveValue::NotSet;
        model.created_at = ActiveValue::NotSet;
        model.update(&self.db_tx).await?;
        Ok(())
    }

    async fn delete_flow(&mut self, flow_id: Uuid) -> ResultEngine<()> {
        flows::Entity::delete_by_id(flow_id.to_string())
            .exec(&self.db_tx)
            .await?;
        Ok(())
    }

    async fn flows_for_wallets(&mut self, wallet_ids: &[Uuid]) -> ResultEngine<Vec<Flow>> {
        if wallet_ids.is_empty() {
            return Ok(Vec::new());
        }
        flows::Entity::find()
            .filter(flows::Column::WalletId.is_in(wallet_ids.iter().map(Uuid::to_string)))
            .order_by_desc(flows::Column::CreatedAt)
            .order_by_desc(flows::Column::Id)
            .all(&self.db_tx)
            .await?
            .into_iter()
            .map(Flow::try_from)
            .collect()
    }

    async fn delete_flows(&mut self, wallet_id: Uuid) -> ResultEngine<()> {
        flows::Entity::delete_many()
            .filter(flows::Column::WalletId.eq(wallet_id.to_string()))
            .exec(&self.db_tx)
            .await?;
        Ok(())
    }

    async fn insert_category(&mut self, category: &Category) -> ResultEngine<()> {
        categories::ActiveModel::from(category)
            .insert(&self.db_tx)
            .await?;
        Ok(())
    }

    async fn category(&mut self, category_id: Uuid) -> ResultEngine<Option<Category>> {
        categories::Entity::find_by_id(category_id.to_string())
            .one(&self.db_tx)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    async fn category_by_name(&mut self, name: &str) -> ResultEngine<Option<Category>> {
        categories::Entity::find()
            .filter(categories::Column::Name.eq(name))
            .one(&self.db_tx)
            .await?
            .map(Category::try_from)
            .transpose()
    }

    async fn update_category(&mut self, category: &Category) -> ResultEngine<()> {
        let mut model = categories::ActiveModel::from(category);
        model.id = ActiveValue::Unchanged(category.id.to_string());
        model.update(&self.db_tx).await?;
        Ok(())
    }

    async fn categories(&mut self) -> ResultEngine<Vec<Category>> {
        categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.db_tx)
            .await?
            .into_iter()
            .map(Category::try_from)
            .collect()
    }

    async fn commit(self: Box<Self>) -> ResultEngine<()> {
        self.db_tx.commit().await?;
        Ok(())
    }
}
