use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;
use url::Url;

use crate::{
    favorites::memory::MemoryFavoritesStore,
    github::GithubConfig,
    login_sessions::memory::MemoryLoginSessions,
    http_server::{cookies::CookieKey, routes::make_router, with_layers},
    recipes::{
        cache::{CacheConfig, MemoryResultCache},
        search::RecipeSearch,
        sources::{RecipeGenerator, RecipeSearcher},
    },
    state::{AppConfig, VersionInfo},
    AppState,
};

/// State wired to the given fakes. The pool never connects unless a handler
/// actually queries it.
pub(crate) fn test_state(
    generator: Arc<dyn RecipeGenerator>,
    searcher: Arc<dyn RecipeSearcher>,
) -> AppState {
    let db = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/recipes_test")
        .unwrap();
    let cache = Arc::new(MemoryResultCache::new(CacheConfig {
        max_sessions: NonZeroUsize::new(100).unwrap(),
        session_ttl: Duration::from_secs(60),
    }));

    AppState {
        app: AppConfig {
            base_url: Url::parse("http://localhost:3000").unwrap(),
        },
        github: GithubConfig {
            client_id: "test-github-id".to_string(),
            client_secret: "test-github-secret".to_string(),
        },
        versions: VersionInfo {
            git_commit: "test-commit",
            rustc_version: "test-rustc",
        },
        db,
        cookie_key: CookieKey(tower_cookies::Key::generate()),
        recipes: RecipeSearch::new(generator.clone(), searcher, cache),
        generator,
        favorites: Arc::new(MemoryFavoritesStore::default()),
        sessions: Arc::new(MemoryLoginSessions::default()),
    }
}

/// A `session_id` cookie for a fresh login of `user_id`, encrypted with the
/// state's key.
pub(crate) async fn login_cookie(state: &AppState, user_id: uuid::Uuid) -> String {
    let session_id = state.sessions.create(user_id).await.unwrap();

    let mut jar = tower_cookies::cookie::CookieJar::new();
    jar.private_mut(&state.cookie_key)
        .add(tower_cookies::Cookie::new("session_id", session_id.to_string()));
    let cookie = jar.get("session_id").unwrap();

    format!("session_id={}", cookie.value())
}

pub(crate) fn create_test_app(state: AppState) -> Router {
    with_layers(make_router().with_state(state))
}

pub(crate) fn json_request(method: &str, uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// The `name=value` pair of a cookie set by `response`, ready to send back.
pub(crate) fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with(&format!("{name}=")))
        .and_then(|v| v.split(';').next())
        .map(ToString::to_string)
}

pub async fn response_body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}
