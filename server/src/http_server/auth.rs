use axum::{
    extract::{Query, State},
    response::Redirect,
};
use db::{login_states::LoginState, users::UserFromDB};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    github,
    http_server::{
        errors::{ApiError, ApiResult, ApiResponse},
        session::{cookie_uuid, remove_cookie, set_cookie, LOGIN_COOKIE, SEARCH_COOKIE},
    },
    recipes::cache::SessionToken,
    AppState,
};

const OAUTH_CALLBACK_PATH: &str = "/auth/github";

/// Only same-site paths are accepted as post-login destinations.
fn safe_return_to(return_to: Option<&str>) -> Option<&str> {
    return_to.filter(|path| path.starts_with('/') && !path.starts_with("//"))
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginQuery {
    return_to: Option<String>,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
) -> Result<Redirect, ApiError> {
    let login_state =
        LoginState::create(&state.db, safe_return_to(query.return_to.as_deref())).await?;

    let url = state.github.authorize_url(
        &state.app.app_url(OAUTH_CALLBACK_PATH),
        &login_state.login_state_id.to_string(),
    )?;

    Ok(Redirect::temporary(url.as_str()))
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubOAuthCode {
    code: String,
    state: Option<Uuid>,
}

#[tracing::instrument(skip_all)]
pub(crate) async fn github_oauth(
    State(app_state): State<AppState>,
    Query(query): Query<GitHubOAuthCode>,
    cookies: Cookies,
) -> Result<Redirect, ApiError> {
    let Some(state_id) = query.state else {
        tracing::warn!("No state provided in Github Oauth Redirect");

        return Err(ApiError::InvalidInput("Missing login state".to_string()));
    };
    let Some(login_state) = LoginState::complete(&app_state.db, state_id).await? else {
        return Err(ApiError::InvalidInput(
            "Unknown or already used login state".to_string(),
        ));
    };

    let github_user = github::user_for_code(
        &app_state.github,
        &query.code,
        &app_state.app.app_url(OAUTH_CALLBACK_PATH),
    )
    .await?;

    let user =
        UserFromDB::upsert_from_github(&app_state.db, &github_user.node_id, &github_user.login)
            .await?;
    let session_id = app_state.sessions.create(user.user_id).await?;
    set_cookie(&cookies, &app_state, LOGIN_COOKIE, session_id.to_string());
    tracing::info!(user_id = %user.user_id, login = github_user.login, "Logged in");

    let return_to = safe_return_to(login_state.return_to.as_deref()).unwrap_or("/");

    Ok(Redirect::temporary(return_to))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoggedOut {
    logged_out: bool,
}

/// Ends the login session, if any, and drops the cached searches of the
/// current browsing session.
pub(crate) async fn logout(State(state): State<AppState>, cookies: Cookies) -> ApiResult<LoggedOut> {
    if let Some(session_id) = cookie_uuid(&cookies, &state, LOGIN_COOKIE) {
        state.sessions.end(session_id).await?;
    }
    remove_cookie(&cookies, &state, LOGIN_COOKIE);

    if let Some(token) = cookie_uuid(&cookies, &state, SEARCH_COOKIE) {
        state.recipes.forget_session(SessionToken(token)).await;
    }
    remove_cookie(&cookies, &state, SEARCH_COOKIE);

    Ok(ApiResponse(LoggedOut { logged_out: true }))
}
