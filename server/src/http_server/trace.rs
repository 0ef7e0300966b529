use tower_http::trace::{MakeSpan, OnResponse};
use tracing::Level;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Tracer;

fn header<'a, B>(request: &'a axum::http::Request<B>, name: &str) -> Option<&'a str> {
    request.headers().get(name).and_then(|h| h.to_str().ok())
}

impl<Body> MakeSpan<Body> for Tracer {
    fn make_span(&mut self, request: &axum::http::Request<Body>) -> tracing::Span {
        let route = http_route(request);
        let span_name = format!("{} {}", request.method(), route);

        tracing::span!(
            Level::INFO,
            "server.request",
            otel.name = span_name,
            kind = "server",
            uri = %request.uri(),
            url.path = %request.uri().path(),
            url.query = request.uri().query(),
            http_version = ?request.version(),
            user_agent.original = header(request, "user-agent"),
            http.route = route,
            http.request.method = %request.method(),
            http.request.header.host = header(request, "host"),
            http.request.header.forwarded_for = header(request, "x-forwarded-for"),
            http.request.header.content_type = header(request, "content-type"),

            http.response.status_code = tracing::field::Empty,
            http.response.header.content_type = tracing::field::Empty,
        )
    }
}

impl<Body> OnResponse<Body> for Tracer {
    fn on_response(
        self,
        response: &axum::http::Response<Body>,
        latency: std::time::Duration,
        span: &tracing::Span,
    ) {
        let status_code = response.status().as_u16();
        tracing::event!(
            Level::INFO,
            status = status_code,
            latency = format_args!("{} ms", latency.as_millis()),
            "finished processing request"
        );

        span.record("http.response.status_code", status_code);
        span.record(
            "http.response.header.content_type",
            response
                .headers()
                .get("content-type")
                .and_then(|h| h.to_str().ok()),
        );
    }
}

#[inline]
fn http_route<B>(req: &axum::http::Request<B>) -> &str {
    req.extensions()
        .get::<axum::extract::MatchedPath>()
        .map_or_else(|| "", |mp| mp.as_str())
}
