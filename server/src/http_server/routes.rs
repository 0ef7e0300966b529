use axum::{
    routing::{get, post},
    Router,
};

use super::{
    api::{self, favorites, method_not_allowed, recipes},
    auth,
};
use crate::AppState;

pub(crate) fn make_router() -> Router<AppState> {
    Router::new()
        .route("/_", get(api::versions))
        .route(
            "/recipes/search",
            post(recipes::search).fallback(method_not_allowed),
        )
        .route(
            "/recipes/alternatives",
            post(recipes::alternatives).fallback(method_not_allowed),
        )
        .route(
            "/favorites",
            get(favorites::list)
                .post(favorites::add)
                .delete(favorites::remove_by_title)
                .fallback(method_not_allowed),
        )
        .route(
            "/favorites/status",
            get(favorites::status).fallback(method_not_allowed),
        )
        .route(
            "/favorites/{id}",
            get(favorites::get_one)
                .delete(favorites::remove_one)
                .fallback(method_not_allowed),
        )
        .route("/login", get(auth::login))
        .route("/auth/github", get(auth::github_oauth))
        .route("/logout", post(auth::logout))
        .fallback(api::not_found)
}
