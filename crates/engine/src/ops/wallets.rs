use uuid::Uuid;

use crate::{ResultEngine, Wallet, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Create a wallet owned by `user_id` and return its id.
    ///
    /// The wallet starts without balance entries.
    pub async fn new_wallet(&self, name: &str, user_id: Uuid) -> ResultEngine<Uuid> {
        let name = normalize_required_name(name, "wallet")?;
        let wallet = Wallet::new(name, user_id);

        with_tx!(self, |tx| {
            self.require_user(&mut *tx, user_id).await?;
            tx.insert_wallet(&wallet).await?;
            tracing::debug!(wallet_id = %wallet.id, %user_id, "wallet created");
            Ok(wallet.id)
        })
    }

    /// Return a wallet with its owners and balances.
    pub async fn wallet(&self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<Wallet> {
        with_tx!(self, |tx| self.require_wallet(&mut *tx, wallet_id, user_id).await)
    }

    /// Return the wallets owned by `user_id`, sorted by name.
    pub async fn wallets(&self, user_id: Uuid) -> ResultEngine<Vec<Wallet>> {
        with_tx!(self, |tx| tx.wallets_owned_by(user_id).await)
    }

    pub async fn rename_wallet(&self, wallet_id: Uuid, name: &str, user_id: Uuid) -> ResultEngine<()> {
        let name = normalize_required_name(name, "wallet")?;

        with_tx!(self, lock wallet_id, |tx| {
            self.require_wallet_owner(&mut *tx, wallet_id, user_id).await?;
            tx.rename_wallet(wallet_id, &name).await?;
            tracing::debug!(%wallet_id, %user_id, "wallet renamed");
            Ok(())
        })
    }

    /// Delete a wallet with its flows, balances and ownership links.
    pub async fn delete_wallet(&self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, lock wallet_id, |tx| {
            self.require_wallet_owner(&mut *tx, wallet_id, user_id).await?;
            tx.delete_flows(wallet_id).await?;
            tx.delete_balances(wallet_id).await?;
            tx.delete_owners(wallet_id).await?;
            tx.delete_wallet(wallet_id).await?;
            Ok(())
        })?;

        self.locks.forget(wallet_id);
        tracing::info!(%wallet_id, %user_id, "wallet deleted");
        Ok(())
    }
}
