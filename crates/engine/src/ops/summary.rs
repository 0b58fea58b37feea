use uuid::Uuid;

use crate::{
    Currency, Dashboard, ResultEngine, WalletSummary,
    summary::{category_totals, converted_total, currency_totals},
};

use super::{Engine, flows::with_operators, with_tx};

impl Engine {
    /// Wallet, its flows (newest first) and category totals in `base`.
    pub async fn wallet_summary(
        &self,
        wallet_id: Uuid,
        user_id: Uuid,
        base: Currency,
    ) -> ResultEngine<WalletSummary> {
        let (wallet, flows) = with_tx!(self, |tx| {
            let wallet = self.require_wallet(&mut *tx, wallet_id, user_id).await?;
            let flows = tx.flows_for_wallets(&[wallet_id]).await?;
            let flows = with_operators(&mut *tx, flows).await?;
            Ok((wallet, flows))
        })?;

        let rates = self.rates.current();
        let categories = category_totals(flows.iter().map(|entry| &entry.flow), &rates, base)?;
        Ok(WalletSummary {
            wallet,
            flows,
            categories,
        })
    }

    /// Every wallet the user owns, per-currency totals and category totals in
    /// `base`.
    pub async fn dashboard(&self, user_id: Uuid, base: Currency) -> ResultEngine<Dashboard> {
        let (wallets, flows) = with_tx!(self, |tx| {
            let wallets = tx.wallets_owned_by(user_id).await?;
            let ids: Vec<Uuid> = wallets.iter().map(|wallet| wallet.id).collect();
            let flows = tx.flows_for_wallets(&ids).await?;
            Ok((wallets, flows))
        })?;

        let rates = self.rates.current();
        let currency_totals = currency_totals(&wallets)?;
        let total = converted_total(&currency_totals, &rates, base);
        let categories = category_totals(&flows, &rates, base)?;
        Ok(Dashboard {
            wallets,
            currency_totals,
            total,
            categories,
        })
    }
}
