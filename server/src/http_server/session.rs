use axum::extract::FromRequestParts;
use color_eyre::eyre::eyre;
use axum::http::request::Parts;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{http_server::errors::ApiError, recipes::cache::SessionToken, AppState};

pub(crate) const LOGIN_COOKIE: &str = "session_id";
pub(crate) const SEARCH_COOKIE: &str = "search_session";

pub(crate) fn cookie_uuid(cookies: &Cookies, state: &AppState, name: &str) -> Option<Uuid> {
    let cookie = cookies.private(&state.cookie_key).get(name)?;

    Uuid::parse_str(cookie.value()).ok()
}

pub(crate) fn set_cookie(cookies: &Cookies, state: &AppState, name: &'static str, value: String) {
    let cookie = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true);

    cookies.private(&state.cookie_key).add(cookie.into());
}

pub(crate) fn remove_cookie(cookies: &Cookies, state: &AppState, name: &'static str) {
    let cookie = Cookie::build(name).path("/");

    cookies.private(&state.cookie_key).remove(cookie.into());
}

/// The browsing session search results are cached under. A new token is
/// issued in the `search_session` cookie when the request has none.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchSession(pub SessionToken);

impl FromRequestParts<AppState> for SearchSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| eyre!("Failed to get cookies: {msg}"))?;

        if let Some(token) = cookie_uuid(&cookies, state, SEARCH_COOKIE) {
            return Ok(Self(SessionToken(token)));
        }

        let token = SessionToken::generate();
        tracing::debug!(session = %token, "Issuing new search session");
        set_cookie(&cookies, state, SEARCH_COOKIE, token.to_string());

        Ok(Self(token))
    }
}

/// A logged in user. Requests without a valid `session_id` cookie are
/// rejected with 401.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| eyre!("Failed to get cookies: {msg}"))?;

        let Some(session_id) = cookie_uuid(&cookies, state, LOGIN_COOKIE) else {
            return Err(ApiError::Unauthorized);
        };

        let Some(user_id) = state.sessions.user_for(session_id).await? else {
            tracing::debug!(%session_id, "Session cookie refers to a missing session");
            return Err(ApiError::Unauthorized);
        };

        Ok(Self { user_id })
    }
}
