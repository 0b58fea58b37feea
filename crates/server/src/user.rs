//! Account endpoints: registration and cookie sessions.

use api_types::user::{Credentials, UserView};
use axum::{Extension, Json, extract::State, http::StatusCode};
use axum_extra::extract::{CookieJar, cookie::Cookie};
use engine::EngineError;

use crate::{
    ServerError,
    server::{CurrentUser, SESSION_COOKIE, ServerState},
};

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<UserView>), ServerError> {
    let id = state
        .engine
        .register_user(&payload.username, &payload.password)
        .await?;
    let user = state.engine.user(id).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserView {
            id,
            username: user.username,
        }),
    ))
}

/// Check the credentials and open a session carried by the `session_id`
/// cookie.
pub async fn login(
    State(state): State<ServerState>,
    jar: CookieJar,
    Json(payload): Json<Credentials>,
) -> Result<(CookieJar, Json<UserView>), ServerError> {
    let id = match state
        .engine
        .authenticate(&payload.username, &payload.password)
        .await
    {
        Ok(id) => id,
        Err(EngineError::KeyNotFound(_)) => return Err(ServerError::Unauthorized),
        Err(err) => return Err(err.into()),
    };
    let user = state.engine.user(id).await?;
    let session_id = state.sessions.insert(id);
    tracing::info!(user_id = %id, "user logged in");

    let cookie = Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .build();
    Ok((
        jar.add(cookie),
        Json(UserView {
            id,
            username: user.username,
        }),
    ))
}

pub async fn logout(
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    State(state): State<ServerState>,
    jar: CookieJar,
) -> (CookieJar, StatusCode) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }
    tracing::info!(%user_id, "user logged out");

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}
