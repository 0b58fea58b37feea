//! Mapping from engine values to response bodies.

use std::collections::HashMap;

use api_types::{
    Balance, category::CategoryTotal, flow::FlowView, wallet::WalletView,
};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use engine::{Balances, CategoryTotals, Currency, Flow, Wallet};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{BASE_COOKIE, ServerState},
};

pub(crate) fn balances(balances: &Balances) -> Vec<Balance> {
    balances
        .iter()
        .map(|(currency, amount)| Balance {
            currency: currency.to_string(),
            amount: amount.to_string(),
        })
        .collect()
}

pub(crate) fn wallet(wallet: &Wallet) -> WalletView {
    WalletView {
        id: wallet.id,
        name: wallet.name.clone(),
        owners: wallet.owners.iter().copied().collect(),
        balances: balances(&wallet.balances),
    }
}

pub(crate) fn flow(flow: &Flow, operator: Option<String>) -> FlowView {
    FlowView {
        id: flow.id,
        wallet_id: flow.wallet_id,
        amount: flow.amount.to_string(),
        currency: flow.currency.to_string(),
        category_id: flow.category_id,
        description: flow.description.clone(),
        created_at: flow.created_at,
        operator_id: flow.operator_id,
        operator,
    }
}

/// Category totals with category names, in category id order.
pub(crate) fn category_totals(
    totals: &CategoryTotals,
    names: &HashMap<Uuid, String>,
) -> Vec<CategoryTotal> {
    totals
        .by_currency
        .iter()
        .map(|(category_id, sums)| CategoryTotal {
            category_id: *category_id,
            name: names.get(category_id).cloned().unwrap_or_default(),
            by_currency: balances(sums),
            total: totals
                .by_category
                .get(category_id)
                .copied()
                .unwrap_or_default(),
        })
        .collect()
}

/// Category id to name, for labelling totals.
pub(crate) async fn category_names(
    state: &ServerState,
) -> Result<HashMap<Uuid, String>, ServerError> {
    Ok(state
        .engine
        .categories()
        .await?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect())
}

/// Base currency of a read view.
///
/// `?base=` wins and is remembered in the base cookie; without it the cookie
/// is used, then the configured default. An unreadable cookie is ignored.
pub(crate) fn base(
    state: &ServerState,
    jar: CookieJar,
    requested: Option<&str>,
) -> Result<(Currency, CookieJar), ServerError> {
    if let Some(code) = requested {
        let base: Currency = code.parse()?;
        let cookie = Cookie::build((BASE_COOKIE, base.to_string()))
            .path("/")
            .build();
        return Ok((base, jar.add(cookie)));
    }
    let base = jar
        .get(BASE_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok())
        .unwrap_or(state.default_base);
    Ok((base, jar))
}
