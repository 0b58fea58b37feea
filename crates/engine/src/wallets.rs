//! The module contains `Wallet` struct and its implementation.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{Amount, Currency, EngineError, ResultEngine};

/// A shared wallet.
///
/// A wallet is a representation of a real wallet, a bank account or anything
/// else where money are kept. It can hold several currencies at once and is
/// jointly owned by one or more users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    /// Stable identifier for this wallet.
    ///
    /// This is a UUID generated once and persisted in the database, so the
    /// wallet can be renamed without breaking references.
    pub id: Uuid,
    pub name: String,
    /// Users allowed to read and mutate the wallet.
    pub owners: BTreeSet<Uuid>,
    /// Running balance per currency. A currency is present once a flow in it
    /// was recorded, even if the balance went back to zero.
    pub balances: BTreeMap<Currency, Amount>,
}

impl Wallet {
    pub fn new(name: String, owner: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            owners: BTreeSet::from([owner]),
            balances: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.owners.contains(&user_id)
    }

    /// Balance in `currency`, if the wallet ever held it.
    #[must_use]
    pub fn balance(&self, currency: Currency) -> Option<Amount> {
        self.balances.get(&currency).copied()
    }

    /// Add `delta` to the balance in `currency`, creating the entry at `delta`
    /// when absent. Returns the new balance.
    pub fn apply(&mut self, currency: Currency, delta: Amount) -> ResultEngine<Amount> {
        let current = self.balance(currency).unwrap_or(Amount::ZERO);
        let next = current
            .checked_add(delta)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        self.balances.insert(currency, next);
        Ok(next)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::flows::Entity")]
    Flows,
    #[sea_orm(has_many = "super::wallet_balances::Entity")]
    Balances,
    #[sea_orm(has_many = "super::wallet_owners::Entity")]
    Owners,
}

impl Related<super::flows::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flows.def()
    }
}

impl Related<super::wallet_balances::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Balances.def()
    }
}

impl Related<super::wallet_owners::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owners.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wallet> for ActiveModel {
    fn from(value: &Wallet) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_creates_then_accumulates() {
        let owner = Uuid::new_v4();
        let mut wallet = Wallet::new(String::from("Cash"), owner);
        assert!(wallet.is_owner(owner));
        assert_eq!(wallet.balance(Currency::CNY), None);

        wallet.apply(Currency::CNY, Amount::new(1_000_000)).unwrap();
        let after = wallet.apply(Currency::CNY, Amount::new(-300_000)).unwrap();

        assert_eq!(after, Amount::new(700_000));
        assert_eq!(wallet.balance(Currency::CNY), Some(Amount::new(700_000)));
        assert_eq!(wallet.balance(Currency::USD), None);
    }

    #[test]
    fn apply_rejects_overflow() {
        let mut wallet = Wallet::new(String::from("Cash"), Uuid::new_v4());
        wallet.apply(Currency::USD, Amount::new(i64::MAX)).unwrap();
        assert!(matches!(
            wallet.apply(Currency::USD, Amount::new(1)),
            Err(EngineError::InvalidAmount(_))
        ));
        assert_eq!(wallet.balance(Currency::USD), Some(Amount::new(i64::MAX)));
    }
}
