use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    Amount, Currency, EditFlowCmd, EngineError, Flow, FlowEntry, RecordFlowCmd, ResultEngine,
    SetBalanceCmd, Wallet, store::StoreTx, util::normalize_text,
};

use super::{Balances, Engine, with_tx};

fn overflow() -> EngineError {
    EngineError::InvalidAmount("balance overflow".to_string())
}

/// Move the balance of `currency` by `delta` and persist the new value.
async fn adjust_balance(
    tx: &mut dyn StoreTx,
    wallet: &mut Wallet,
    currency: Currency,
    delta: Amount,
) -> ResultEngine<()> {
    let balance = wallet.apply(currency, delta)?;
    tx.put_balance(wallet.id, currency, balance).await
}

/// Resolve operator usernames for display.
pub(super) async fn with_operators(
    tx: &mut dyn StoreTx,
    flows: Vec<Flow>,
) -> ResultEngine<Vec<FlowEntry>> {
    let mut names: HashMap<Uuid, String> = HashMap::new();
    let mut entries = Vec::with_capacity(flows.len());
    for flow in flows {
        let operator = match names.get(&flow.operator_id) {
            Some(name) => name.clone(),
            None => {
                let name = tx
                    .user(flow.operator_id)
                    .await?
                    .map(|user| user.username)
                    .unwrap_or_default();
                names.insert(flow.operator_id, name.clone());
                name
            }
        };
        entries.push(FlowEntry { flow, operator });
    }
    Ok(entries)
}

impl Engine {
    /// Append a flow and add its amount to the wallet balance in the flow
    /// currency, creating the balance entry when absent.
    ///
    /// Returns the flow id and the balances after the change.
    pub async fn record_flow(&self, cmd: RecordFlowCmd) -> ResultEngine<(Uuid, Balances)> {
        let flow = Flow {
            id: Uuid::new_v4(),
            wallet_id: cmd.wallet_id,
            amount: cmd.amount,
            currency: cmd.currency,
            category_id: cmd.category_id,
            description: normalize_text(&cmd.description),
            created_at: cmd.created_at,
            operator_id: cmd.user_id,
        };

        with_tx!(self, lock cmd.wallet_id, |tx| {
            let mut wallet = self.require_wallet(&mut *tx, flow.wallet_id, flow.operator_id).await?;
            self.require_category(&mut *tx, flow.category_id).await?;
            self.append_flow(&mut *tx, &mut wallet, &flow).await?;
            Ok((flow.id, wallet.balances))
        })
    }

    /// Correct the balance of one currency to `target`.
    ///
    /// Records a flow of `target - current` (current is zero when the wallet
    /// never held the currency), so afterwards the balance equals `target`.
    pub async fn set_balance(&self, cmd: SetBalanceCmd) -> ResultEngine<(Uuid, Balances)> {
        let description = normalize_text(&cmd.description);

        with_tx!(self, lock cmd.wallet_id, |tx| {
            let mut wallet = self.require_wallet(&mut *tx, cmd.wallet_id, cmd.user_id).await?;
            self.require_category(&mut *tx, cmd.category_id).await?;
            let current = wallet.balance(cmd.currency).unwrap_or(Amount::ZERO);
            let diff = cmd.target.checked_sub(current).ok_or_else(overflow)?;
            let flow = Flow {
                id: Uuid::new_v4(),
                wallet_id: cmd.wallet_id,
                amount: diff,
                currency: cmd.currency,
                category_id: cmd.category_id,
                description: description.clone(),
                created_at: chrono::Utc::now(),
                operator_id: cmd.user_id,
            };
            self.append_flow(&mut *tx, &mut wallet, &flow).await?;
            Ok((flow.id, wallet.balances))
        })
    }

    async fn append_flow(
        &self,
        tx: &mut dyn StoreTx,
        wallet: &mut Wallet,
        flow: &Flow,
    ) -> ResultEngine<()> {
        adjust_balance(tx, wallet, flow.currency, flow.amount).await?;
        tx.insert_flow(flow).await?;
        tracing::debug!(
            wallet_id = %wallet.id,
            flow_id = %flow.id,
            amount = %flow.amount,
            currency = %flow.currency,
            "flow recorded"
        );
        Ok(())
    }

    /// Wallet of a flow the user may access.
    ///
    /// The wallet id of a flow never changes, so it can be resolved before
    /// taking the wallet lock.
    async fn flow_wallet(&self, flow_id: Uuid, user_id: Uuid) -> ResultEngine<Uuid> {
        with_tx!(self, |tx| {
            let flow = self.require_flow(&mut *tx, flow_id, user_id).await?;
            Ok(flow.wallet_id)
        })
    }

    /// Rewrite a flow: its old amount leaves the old currency balance, the new
    /// amount enters the new currency balance, and the acting user becomes the
    /// operator. The creation time is kept.
    pub async fn edit_flow(&self, cmd: EditFlowCmd) -> ResultEngine<Balances> {
        let wallet_id = self.flow_wallet(cmd.flow_id, cmd.user_id).await?;
        let description = normalize_text(&cmd.description);

        with_tx!(self, lock wallet_id, |tx| {
            let old = self.require_flow(&mut *tx, cmd.flow_id, cmd.user_id).await?;
            let mut wallet = self.require_wallet(&mut *tx, old.wallet_id, cmd.user_id).await?;
            self.require_category(&mut *tx, cmd.category_id).await?;

            let reverse = old.amount.checked_neg().ok_or_else(overflow)?;
            adjust_balance(&mut *tx, &mut wallet, old.currency, reverse).await?;
            adjust_balance(&mut *tx, &mut wallet, cmd.currency, cmd.amount).await?;

            let flow = Flow {
                amount: cmd.amount,
                currency: cmd.currency,
                category_id: cmd.category_id,
                description: description.clone(),
                operator_id: cmd.user_id,
                ..old
            };
            tx.update_flow(&flow).await?;
            tracing::debug!(%wallet_id, flow_id = %flow.id, "flow edited");
            Ok(wallet.balances)
        })
    }

    /// Remove a flow and take its amount back out of the balance.
    ///
    /// The balance entry stays, possibly at zero.
    pub async fn delete_flow(&self, flow_id: Uuid, user_id: Uuid) -> ResultEngine<Balances> {
        let wallet_id = self.flow_wallet(flow_id, user_id).await?;

        with_tx!(self, lock wallet_id, |tx| {
            let flow = self.require_flow(&mut *tx, flow_id, user_id).await?;
            let mut wallet = self.require_wallet(&mut *tx, flow.wallet_id, user_id).await?;
            let reverse = flow.amount.checked_neg().ok_or_else(overflow)?;
            adjust_balance(&mut *tx, &mut wallet, flow.currency, reverse).await?;
            tx.delete_flow(flow.id).await?;
            tracing::debug!(%wallet_id, %flow_id, "flow deleted");
            Ok(wallet.balances)
        })
    }

    pub async fn flow(&self, flow_id: Uuid, user_id: Uuid) -> ResultEngine<Flow> {
        with_tx!(self, |tx| self.require_flow(&mut *tx, flow_id, user_id).await)
    }

    /// Flows of a wallet, newest first, with operator usernames.
    pub async fn flows(&self, wallet_id: Uuid, user_id: Uuid) -> ResultEngine<Vec<FlowEntry>> {
        with_tx!(self, |tx| {
            self.require_wallet_owner(&mut *tx, wallet_id, user_id).await?;
            let flows = tx.flows_for_wallets(&[wallet_id]).await?;
            with_operators(&mut *tx, flows).await
        })
    }
}
