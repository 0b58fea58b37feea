//! Wallet API endpoints.

use api_types::{
    dashboard::BaseQuery,
    wallet::{WalletCreated, WalletNew, WalletRename, WalletShare, WalletSummary},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views,
};

/// Handle requests for creating a new wallet owned by the caller.
pub async fn wallet_new(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<(StatusCode, Json<WalletCreated>), ServerError> {
    let id = state.engine.new_wallet(&payload.name, user_id).await?;
    Ok((StatusCode::CREATED, Json(WalletCreated { id })))
}

/// Wallet with its flows and category totals in the requested base currency.
pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    jar: CookieJar,
    Query(query): Query<BaseQuery>,
) -> Result<(CookieJar, Json<WalletSummary>), ServerError> {
    let (base, jar) = views::base(&state, jar, query.base.as_deref())?;
    let summary = state
        .engine
        .wallet_summary(wallet_id, user_id, base)
        .await?;
    let names = views::category_names(&state).await?;

    Ok((
        jar,
        Json(WalletSummary {
            wallet: views::wallet(&summary.wallet),
            flows: summary
                .flows
                .iter()
                .map(|entry| views::flow(&entry.flow, Some(entry.operator.clone())))
                .collect(),
            base: base.to_string(),
            categories: views::category_totals(&summary.categories, &names),
            total: summary.categories.total(),
        }),
    ))
}

pub async fn rename(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletRename>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .rename_wallet(wallet_id, &payload.name, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_wallet(wallet_id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Add another user to the wallet owners.
pub async fn share(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletShare>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .share_wallet(wallet_id, user_id, &payload.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
