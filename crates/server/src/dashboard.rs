//! Read-only overview endpoints.

use api_types::dashboard::{BaseQuery, Currencies, Dashboard};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use axum_extra::extract::CookieJar;

use crate::{
    ServerError,
    server::{CurrentUser, ServerState},
    views,
};

/// Every wallet of the caller with totals converted to the base currency.
pub async fn get(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    jar: CookieJar,
    Query(query): Query<BaseQuery>,
) -> Result<(CookieJar, Json<Dashboard>), ServerError> {
    let (base, jar) = views::base(&state, jar, query.base.as_deref())?;
    let dashboard = state.engine.dashboard(user_id, base).await?;
    let names = views::category_names(&state).await?;

    Ok((
        jar,
        Json(Dashboard {
            base: base.to_string(),
            wallets: dashboard.wallets.iter().map(views::wallet).collect(),
            currency_totals: views::balances(&dashboard.currency_totals),
            total: dashboard.total,
            categories: views::category_totals(&dashboard.categories, &names),
        }),
    ))
}

/// Currency codes the converter knows about.
pub async fn currencies(State(state): State<ServerState>) -> Json<Currencies> {
    let table = state.engine.rates().current();
    Json(Currencies {
        codes: table.codes().iter().map(ToString::to_string).collect(),
        rates_version: table.version(),
    })
}
