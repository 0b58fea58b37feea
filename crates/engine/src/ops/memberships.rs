use uuid::Uuid;

use crate::{EngineError, ResultEngine, util::normalize_text};

use super::{Engine, with_tx};

impl Engine {
    /// Make the user called `username` an owner of the wallet.
    ///
    /// Only an owner can share. Sharing with an existing owner is a no-op and
    /// there is no way to remove an owner.
    pub async fn share_wallet(
        &self,
        wallet_id: Uuid,
        granter_id: Uuid,
        username: &str,
    ) -> ResultEngine<()> {
        let username = normalize_text(username);

        with_tx!(self, lock wallet_id, |tx| {
            self.require_wallet_owner(&mut *tx, wallet_id, granter_id).await?;
            let target = tx
                .user_by_username(&username)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))?;
            tx.add_owner(wallet_id, target.id).await?;
            tracing::debug!(%wallet_id, %granter_id, owner_id = %target.id, "wallet shared");
            Ok(())
        })
    }
}
