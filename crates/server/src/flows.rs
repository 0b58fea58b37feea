//! Flow API endpoints.
//!
//! Amounts and currencies arrive as strings and are parsed here; a value that
//! does not parse is rejected with 422 before the engine is called.

use api_types::flow::{BalanceSet, BalancesView, FlowInput, FlowRecorded, FlowView};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{Amount, Currency, EditFlowCmd, RecordFlowCmd, SetBalanceCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views,
};

fn parse_money(amount: &str, currency: &str) -> Result<(Amount, Currency), ServerError> {
    Ok((amount.parse()?, currency.parse()?))
}

pub async fn flow_new(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<FlowInput>,
) -> Result<(StatusCode, Json<FlowRecorded>), ServerError> {
    let (amount, currency) = parse_money(&payload.amount, &payload.currency)?;
    let cmd = RecordFlowCmd::new(wallet_id, user_id, amount, currency, payload.category_id)
        .description(payload.description);

    let (id, balances) = state.engine.record_flow(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(FlowRecorded {
            id,
            balances: views::balances(&balances),
        }),
    ))
}

/// Correct a balance to a target value by recording the difference.
pub async fn balance_set(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<BalanceSet>,
) -> Result<(StatusCode, Json<FlowRecorded>), ServerError> {
    let (target, currency) = parse_money(&payload.target, &payload.currency)?;
    let cmd = SetBalanceCmd::new(wallet_id, user_id, target, currency, payload.category_id)
        .description(payload.description);

    let (id, balances) = state.engine.set_balance(cmd).await?;
    Ok((
        StatusCode::CREATED,
        Json(FlowRecorded {
            id,
            balances: views::balances(&balances),
        }),
    ))
}

pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(flow_id): Path<Uuid>,
) -> Result<Json<FlowView>, ServerError> {
    let flow = state.engine.flow(flow_id, user_id).await?;
    Ok(Json(views::flow(&flow, None)))
}

pub async fn update(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(flow_id): Path<Uuid>,
    Json(payload): Json<FlowInput>,
) -> Result<Json<BalancesView>, ServerError> {
    let (amount, currency) = parse_money(&payload.amount, &payload.currency)?;
    let cmd = EditFlowCmd::new(flow_id, user_id, amount, currency, payload.category_id)
        .description(payload.description);

    let balances = state.engine.edit_flow(cmd).await?;
    Ok(Json(BalancesView {
        balances: views::balances(&balances),
    }))
}

pub async fn delete(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(flow_id): Path<Uuid>,
) -> Result<Json<BalancesView>, ServerError> {
    let balances = state.engine.delete_flow(flow_id, user_id).await?;
    Ok(Json(BalancesView {
        balances: views::balances(&balances),
    }))
}
