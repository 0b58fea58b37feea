//! Ledger core of famoney.
//!
//! Shared wallets hold balances in several currencies at once. Every balance
//! change is explained by a flow in the journal, and the engine keeps the two
//! consistent inside one store transaction per operation.
//!
//! Entry point is [`Engine`]; see [`store`] for the persistence seam and
//! [`rates`] for currency conversion.

pub use categories::Category;
pub use commands::{EditFlowCmd, RecordFlowCmd, SetBalanceCmd};
pub use currency::Currency;
pub use error::EngineError;
pub use flows::{Flow, FlowEntry};
pub use money::Amount;
pub use ops::{Balances, Engine, EngineBuilder};
pub use rates::{RateError, RateSource, RateTable, Rates};
pub use summary::{CategoryTotals, Dashboard, WalletSummary};
pub use users::User;
pub use wallets::Wallet;

mod categories;
mod commands;
mod currency;
mod error;
mod flows;
mod locks;
mod money;
mod ops;
pub mod rates;
pub mod store;
pub mod summary;
mod users;
mod util;
mod wallet_balances;
mod wallet_owners;
mod wallets;

pub type ResultEngine<T> = Result<T, EngineError>;
