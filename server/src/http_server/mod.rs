use std::net::SocketAddr;

use axum::Router;
use color_eyre::eyre::WrapErr;
use tokio::net::TcpListener;
use tower_cookies::CookieManagerLayer;

pub(crate) mod api;
pub(crate) mod auth;
pub(crate) mod cmd;
pub(crate) mod cookies;
pub(crate) mod errors;
pub(crate) mod routes;
pub(crate) mod session;
pub(crate) mod trace;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Adds the request tracing and cookie layers every route relies on.
pub(crate) fn with_layers(routes: Router) -> Router {
    let tracer = trace::Tracer;
    let trace_layer = tower_http::trace::TraceLayer::new_for_http()
        .make_span_with(tracer)
        .on_response(tracer);

    routes.layer(trace_layer).layer(CookieManagerLayer::new())
}

pub(crate) async fn run_server(routes: Router) -> color_eyre::Result<()> {
    let app = with_layers(routes);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let port: u16 = port.parse().wrap_err("PORT must be a valid port number")?;
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!("Starting server on port {}", port);
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err("Failed to open port")?;

    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .await
        .wrap_err("Failed to run server")
}
