use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use engine::{Currency, Engine};
use uuid::Uuid;

use std::sync::Arc;

use crate::{SessionStore, categories, dashboard, flows, user, wallets};

/// Name of the cookie carrying the session id.
pub(crate) const SESSION_COOKIE: &str = "session_id";
/// Name of the cookie remembering the last requested base currency.
pub(crate) const BASE_COOKIE: &str = "base";

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub sessions: Arc<SessionStore>,
    /// Base currency of read views when neither `?base=` nor the base cookie
    /// names one.
    pub default_base: Currency,
}

impl ServerState {
    pub fn new(engine: Arc<Engine>, default_base: Currency) -> Self {
        Self {
            engine,
            sessions: Arc::new(SessionStore::new()),
            default_base,
        }
    }
}

/// The user a request acts for, resolved from its session cookie.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CurrentUser(pub Uuid);

async fn auth(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| state.sessions.get(cookie.value()))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

fn router(state: ServerState) -> Router {
    let protected = Router::new()
        .route("/logout", post(user::logout))
        .route("/dashboard", get(dashboard::get))
        .route("/currencies", get(dashboard::currencies))
        .route("/wallets", post(wallets::wallet_new))
        .route(
            "/wallets/{wallet_id}",
            get(wallets::get)
                .patch(wallets::rename)
                .delete(wallets::delete),
        )
        .route("/wallets/{wallet_id}/share", post(wallets::share))
        .route("/wallets/{wallet_id}/flows", post(flows::flow_new))
        .route("/wallets/{wallet_id}/balance", post(flows::balance_set))
        .route(
            "/flows/{flow_id}",
            get(flows::get).patch(flows::update).delete(flows::delete),
        )
        .route(
            "/categories",
            get(categories::list).post(categories::category_new),
        )
        .route(
            "/categories/{category_id}",
            axum::routing::patch(categories::rename),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth));

    Router::new()
        .route("/register", post(user::register))
        .route("/login", post(user::login))
        .merge(protected)
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, header},
    };
    use http_body_util::BodyExt;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        let engine = Engine::builder().build();
        router(ServerState::new(Arc::new(engine), Currency::CNY))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, json) = send_raw(app, method, uri, cookie, body).await;
        (status, json)
    }

    async fn send_raw(
        app: &Router,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|value| value.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, set_cookie, json)
    }

    /// Register and log in, returning the `Cookie` header value.
    async fn login(app: &Router, username: &str) -> String {
        let credentials = json!({ "username": username, "password": "secret" });
        let (status, _) = send(app, "POST", "/register", None, Some(credentials.clone())).await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, set_cookie, _) =
            send_raw(app, "POST", "/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::OK);
        let set_cookie = set_cookie.unwrap();
        let pair = set_cookie.split(';').next().unwrap().to_string();
        assert!(pair.starts_with("session_id="));
        pair
    }

    fn id(value: &Value) -> String {
        value["id"].as_str().unwrap().to_string()
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn requests_without_session_are_unauthorized() {
        let app = app();
        let (status, _) = send(&app, "GET", "/dashboard", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, "GET", "/dashboard", Some("session_id=bogus"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let app = app();
        login(&app, "alice").await;

        let credentials = json!({ "username": "alice", "password": "wrong" });
        let (status, _) = send(&app, "POST", "/login", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let app = app();
        login(&app, "alice").await;

        let credentials = json!({ "username": "alice", "password": "other" });
        let (status, _) = send(&app, "POST", "/register", None, Some(credentials)).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let app = app();
        let cookie = login(&app, "alice").await;

        let (status, _) = send(&app, "POST", "/logout", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "GET", "/dashboard", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn flows_update_balances_and_category_totals() {
        let app = app();
        let cookie = login(&app, "alice").await;

        let (status, category) = send(
            &app,
            "POST",
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "Food" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let category_id = id(&category);

        let (status, wallet) = send(
            &app,
            "POST",
            "/wallets",
            Some(&cookie),
            Some(json!({ "name": "Home" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let wallet_id = id(&wallet);

        let flows_uri = format!("/wallets/{wallet_id}/flows");
        let (status, recorded) = send(
            &app,
            "POST",
            &flows_uri,
            Some(&cookie),
            Some(json!({ "amount": "100", "currency": "cny", "category_id": category_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["balances"], json!([{ "currency": "CNY", "amount": "100.00" }]));

        let (status, recorded) = send(
            &app,
            "POST",
            &flows_uri,
            Some(&cookie),
            Some(json!({
                "amount": "-30",
                "currency": "CNY",
                "category_id": category_id,
                "description": "lunch"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["balances"][0]["amount"], "70.00");

        let (status, summary) = send(
            &app,
            "GET",
            &format!("/wallets/{wallet_id}"),
            Some(&cookie),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["base"], "CNY");
        assert_eq!(summary["flows"].as_array().unwrap().len(), 2);
        assert_eq!(summary["flows"][0]["description"], "lunch");
        assert_eq!(summary["flows"][0]["operator"], "alice");
        assert_eq!(summary["categories"][0]["name"], "Food");
        assert_eq!(decimal(&summary["categories"][0]["total"]), dec!(70));
        assert_eq!(decimal(&summary["total"]), dec!(70));
    }

    #[tokio::test]
    async fn set_balance_edit_and_delete() {
        let app = app();
        let cookie = login(&app, "alice").await;
        let (_, category) = send(
            &app,
            "POST",
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "Adjust" })),
        )
        .await;
        let category_id = id(&category);
        let (_, wallet) = send(
            &app,
            "POST",
            "/wallets",
            Some(&cookie),
            Some(json!({ "name": "Cash" })),
        )
        .await;
        let wallet_id = id(&wallet);

        let (status, recorded) = send(
            &app,
            "POST",
            &format!("/wallets/{wallet_id}/balance"),
            Some(&cookie),
            Some(json!({ "target": "500", "currency": "EUR", "category_id": category_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(recorded["balances"][0]["amount"], "500.00");
        let flow_uri = format!("/flows/{}", id(&recorded));

        let (status, flow) = send(&app, "GET", &flow_uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(flow["amount"], "500.00");

        let (status, balances) = send(
            &app,
            "PATCH",
            &flow_uri,
            Some(&cookie),
            Some(json!({ "amount": "20", "currency": "USD", "category_id": category_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            balances["balances"],
            json!([
                { "currency": "EUR", "amount": "0.00" },
                { "currency": "USD", "amount": "20.00" }
            ])
        );

        let (status, balances) = send(&app, "DELETE", &flow_uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(balances["balances"][1]["amount"], "0.00");

        let (status, _) = send(&app, "GET", &flow_uri, Some(&cookie), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unparseable_amount_is_rejected() {
        let app = app();
        let cookie = login(&app, "alice").await;
        let (_, category) = send(
            &app,
            "POST",
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "Food" })),
        )
        .await;
        let (_, wallet) = send(
            &app,
            "POST",
            "/wallets",
            Some(&cookie),
            Some(json!({ "name": "Home" })),
        )
        .await;

        let (status, _) = send(
            &app,
            "POST",
            &format!("/wallets/{}/flows", id(&wallet)),
            Some(&cookie),
            Some(json!({ "amount": "ten", "currency": "CNY", "category_id": id(&category) })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn wallets_are_hidden_until_shared() {
        let app = app();
        let alice = login(&app, "alice").await;
        let bob = login(&app, "bob").await;
        let (_, wallet) = send(
            &app,
            "POST",
            "/wallets",
            Some(&alice),
            Some(json!({ "name": "Family" })),
        )
        .await;
        let wallet_uri = format!("/wallets/{}", id(&wallet));

        let (status, _) = send(&app, "GET", &wallet_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(
            &app,
            "POST",
            &format!("{wallet_uri}/share"),
            Some(&alice),
            Some(json!({ "username": "bob" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, summary) = send(&app, "GET", &wallet_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["wallet"]["owners"].as_array().unwrap().len(), 2);

        let (status, _) = send(
            &app,
            "PATCH",
            &wallet_uri,
            Some(&bob),
            Some(json!({ "name": "Shared" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, dashboard) = send(&app, "GET", "/dashboard?base=usd", Some(&alice), None).await;
        assert_eq!(dashboard["base"], "USD");
        assert_eq!(dashboard["wallets"][0]["name"], "Shared");

        let (status, _) = send(&app, "DELETE", &wallet_uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &wallet_uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn category_rename_conflicts_with_existing_name() {
        let app = app();
        let cookie = login(&app, "alice").await;
        send(&app, "POST", "/categories", Some(&cookie), Some(json!({ "name": "Food" }))).await;
        let (_, rent) = send(
            &app,
            "POST",
            "/categories",
            Some(&cookie),
            Some(json!({ "name": "Rent" })),
        )
        .await;

        let (status, _) = send(
            &app,
            "PATCH",
            &format!("/categories/{}", id(&rent)),
            Some(&cookie),
            Some(json!({ "name": "Food" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, categories) = send(&app, "GET", "/categories", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(categories.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn currencies_list_the_rate_table() {
        let app = app();
        let cookie = login(&app, "alice").await;

        let (status, currencies) = send(&app, "GET", "/currencies", Some(&cookie), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(currencies["codes"], json!(["USD"]));
    }

    #[tokio::test]
    async fn requested_base_is_remembered_in_a_cookie() {
        let app = app();
        let session = login(&app, "alice").await;

        let (status, set_cookie, dashboard) =
            send_raw(&app, "GET", "/dashboard?base=usd", Some(&session), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dashboard["base"], "USD");
        let set_cookie = set_cookie.unwrap();
        let base = set_cookie.split(';').next().unwrap();
        assert_eq!(base, "base=USD");

        let cookies = format!("{session}; {base}");
        let (_, dashboard) = send(&app, "GET", "/dashboard", Some(&cookies), None).await;
        assert_eq!(dashboard["base"], "USD");

        let (_, dashboard) = send(&app, "GET", "/dashboard", Some(&session), None).await;
        assert_eq!(dashboard["base"], "CNY");
    }
}
