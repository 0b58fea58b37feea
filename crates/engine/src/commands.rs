//! Command structs for engine operations.
//!
//! These types group parameters for flow writes (record, set balance, edit),
//! keeping call sites readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Amount, Currency};

/// Append a flow to a wallet and move its balance by the flow amount.
#[derive(Clone, Debug)]
pub struct RecordFlowCmd {
    pub wallet_id: Uuid,
    pub user_id: Uuid,
    pub amount: Amount,
    pub currency: Currency,
    pub category_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl RecordFlowCmd {
    #[must_use]
    pub fn new(
        wallet_id: Uuid,
        user_id: Uuid,
        amount: Amount,
        currency: Currency,
        category_id: Uuid,
    ) -> Self {
        Self {
            wallet_id,
            user_id,
            amount,
            currency,
            category_id,
            description: String::new(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Override the creation time (defaults to now).
    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Correct a wallet balance to an absolute target.
///
/// The engine records a flow of `target - current` so the journal keeps
/// explaining the balance.
#[derive(Clone, Debug)]
pub struct SetBalanceCmd {
    pub wallet_id: Uuid,
    pub user_id: Uuid,
    pub target: Amount,
    pub currency: Currency,
    pub category_id: Uuid,
    pub description: String,
}

impl SetBalanceCmd {
    #[must_use]
    pub fn new(
        wallet_id: Uuid,
        user_id: Uuid,
        target: Amount,
        currency: Currency,
        category_id: Uuid,
    ) -> Self {
        Self {
            wallet_id,
            user_id,
            target,
            currency,
            category_id,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Rewrite an existing flow.
///
/// Every field is replaced; the acting user becomes the flow operator.
#[derive(Clone, Debug)]
pub struct EditFlowCmd {
    pub flow_id: Uuid,
    pub user_id: Uuid,
    pub amount: Amount,
    pub currency: Currency,
    pub category_id: Uuid,
    pub description: String,
}

impl EditFlowCmd {
    #[must_use]
    pub fn new(
        flow_id: Uuid,
        user_id: Uuid,
        amount: Amount,
        currency: Currency,
        category_id: Uuid,
    ) -> Self {
        Self {
            flow_id,
            user_id,
            amount,
            currency,
            category_id,
            description: String::new(),
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
