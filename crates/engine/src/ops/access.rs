use uuid::Uuid;

use crate::{Category, EngineError, Flow, ResultEngine, Wallet, store::StoreTx};

use super::Engine;

pub(super) fn wallet_not_found() -> EngineError {
    EngineError::KeyNotFound("wallet not exists".to_string())
}

pub(super) fn flow_not_found() -> EngineError {
    EngineError::KeyNotFound("flow not exists".to_string())
}

impl Engine {
    /// Load a wallet the user owns.
    ///
    /// A missing wallet and a wallet owned by someone else produce the same
    /// error.
    pub(super) async fn require_wallet(
        &self,
        tx: &mut dyn StoreTx,
        wallet_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Wallet> {
        tx.wallet(wallet_id)
            .await?
            .filter(|wallet| wallet.is_owner(user_id))
            .ok_or_else(wallet_not_found)
    }

    pub(super) async fn require_wallet_owner(
        &self,
        tx: &mut dyn StoreTx,
        wallet_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        if !tx.is_owner(wallet_id, user_id).await? {
            return Err(wallet_not_found());
        }
        Ok(())
    }

    /// Load a flow whose wallet the user owns.
    pub(super) async fn require_flow(
        &self,
        tx: &mut dyn StoreTx,
        flow_id: Uuid,
        user_id: Uuid,
    ) -> ResultEngine<Flow> {
        let flow = tx.flow(flow_id).await?.ok_or_else(flow_not_found)?;
        if !tx.is_owner(flow.wallet_id, user_id).await? {
            return Err(flow_not_found());
        }
        Ok(flow)
    }

    pub(super) async fn require_category(
        &self,
        tx: &mut dyn StoreTx,
        category_id: Uuid,
    ) -> ResultEngine<Category> {
        tx.category(category_id)
            .await?
            .ok_or_else(|| EngineError::InvalidCategory(format!("unknown category {category_id}")))
    }

    pub(super) async fn require_user(
        &self,
        tx: &mut dyn StoreTx,
        user_id: Uuid,
    ) -> ResultEngine<crate::User> {
        tx.user(user_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }
}
