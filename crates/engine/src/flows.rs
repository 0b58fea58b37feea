//! Flow journal records.
//!
//! A flow is one signed movement of money recorded against a wallet in a
//! single currency. The wallet balance in that currency always equals the sum
//! of the wallet's live flows.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{
    Amount, Currency, EngineError, ResultEngine,
    util::{model_currency, parse_uuid},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Flow {
    pub id: Uuid,
    /// Set at creation and never changed.
    pub wallet_id: Uuid,
    /// Positive for inflows, negative for outflows.
    pub amount: Amount,
    pub currency: Currency,
    pub category_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
    /// User who recorded the flow or last rewrote it.
    pub operator_id: Uuid,
}

/// A flow together with the username of its operator, ready for display.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowEntry {
    pub flow: Flow,
    /// Empty when the operator account is gone.
    pub operator: String,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flows")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub wallet_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub category_id: String,
    pub description: String,
    pub created_at: DateTimeUtc,
    pub operator_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletId",
        to = "super::wallets::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Wallet,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::wallets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallet.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Flow> for ActiveModel {
    fn from(value: &Flow) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            wallet_id: ActiveValue::Set(value.wallet_id.to_string()),
            amount_minor: ActiveValue::Set(value.amount.minor()),
            currency: ActiveValue::Set(value.currency.code().to_string()),
            category_id: ActiveValue::Set(value.category_id.to_string()),
            description: ActiveValue::Set(value.description.clone()),
            created_at: ActiveValue::Set(value.created_at),
            operator_id: ActiveValue::Set(value.operator_id.to_string()),
        }
    }
}

impl TryFrom<Model> for Flow {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "flow")?,
            wallet_id: parse_uuid(&model.wallet_id, "wallet")?,
            amount: Amount::new(model.amount_minor),
            currency: model_currency(&model.currency)?,
            category_id: parse_uuid(&model.category_id, "category")?,
            description: model.description,
            created_at: model.created_at,
            operator_id: parse_uuid(&model.operator_id, "user")?,
        })
    }
}
