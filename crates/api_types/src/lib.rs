//! Request and response bodies of the HTTP API.
//!
//! Money amounts travel as decimal strings (`"12.50"`, `"-3"`), currency codes
//! as three letter strings. Converted figures are `Decimal`, serialized as
//! strings as well.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Amount held in one currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub amount: String,
}

pub mod user {
    use super::*;

    /// Body of `/register` and `/login`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub username: String,
    }
}

pub mod wallet {
    use super::*;
    use crate::{category::CategoryTotal, flow::FlowView};

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletNew {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletCreated {
        pub id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletRename {
        pub name: String,
    }

    /// Add the user called `username` to the wallet owners.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletShare {
        pub username: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletView {
        pub id: Uuid,
        pub name: String,
        pub owners: Vec<Uuid>,
        /// Sorted by currency code.
        pub balances: Vec<Balance>,
    }

    /// `GET /wallets/{id}`
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WalletSummary {
        pub wallet: WalletView,
        /// Newest first.
        pub flows: Vec<FlowView>,
        pub base: String,
        pub categories: Vec<CategoryTotal>,
        /// Sum of the category totals in `base`.
        pub total: Decimal,
    }
}

pub mod flow {
    use super::*;

    /// Append a flow (`POST /wallets/{id}/flows`) or rewrite one
    /// (`PATCH /flows/{id}`).
    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowInput {
        /// Signed: positive for inflows, negative for outflows.
        pub amount: String,
        pub currency: String,
        pub category_id: Uuid,
        #[serde(default)]
        pub description: String,
    }

    /// `POST /wallets/{id}/balance`
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalanceSet {
        pub target: String,
        pub currency: String,
        pub category_id: Uuid,
        #[serde(default)]
        pub description: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowView {
        pub id: Uuid,
        pub wallet_id: Uuid,
        pub amount: String,
        pub currency: String,
        pub category_id: Uuid,
        pub description: String,
        pub created_at: DateTime<Utc>,
        pub operator_id: Uuid,
        /// Only filled in listings.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub operator: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FlowRecorded {
        pub id: Uuid,
        pub balances: Vec<Balance>,
    }

    /// Wallet balances after an edit or delete.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesView {
        pub balances: Vec<Balance>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryInput {
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryTotal {
        pub category_id: Uuid,
        /// Empty when the category is unknown.
        pub name: String,
        /// Raw sum per currency.
        pub by_currency: Vec<Balance>,
        /// Every currency sum converted to the base currency and added up.
        pub total: Decimal,
    }
}

pub mod dashboard {
    use super::*;
    use crate::{category::CategoryTotal, wallet::WalletView};

    /// `?base=` query string of the read views.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BaseQuery {
        pub base: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Dashboard {
        pub base: String,
        pub wallets: Vec<WalletView>,
        /// Wallet balances added up per currency, unconverted.
        pub currency_totals: Vec<Balance>,
        /// `currency_totals` converted to `base`.
        pub total: Decimal,
        pub categories: Vec<CategoryTotal>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Currencies {
        pub codes: Vec<String>,
        pub rates_version: u64,
    }
}
