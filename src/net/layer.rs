pub mod timeout;
pub mod request_id;

pub use timeout::TimeoutLayer;
pub use request_id::RIDLayer;

pub mod trace {
    use std::time::Duration;

    use axum::http::{Request, Response};
    use tracing::Span;
    use tower_http::classify::ServerErrorsFailureClass;

    use super::request_id::RequestId;

    pub fn make_span_with<B>(request: &Request<B>) -> Span {
        let id = RequestId::try_get(request)
            .map(|req_id| *req_id.id())
            .unwrap_or(0);

        tracing::info_span!(
            "REQ",
            i = id,
            v = ?request.version(),
            m = %request.method(),
            u = %request.uri(),
            s = tracing::field::Empty
        )
    }

    pub fn on_request<B>(_request: &Request<B>, _span: &Span) {}

    pub fn on_response<B>(response: &Response<B>, latency: Duration, span: &Span) {
        span.record("s", &tracing::field::display(response.status()));

        tracing::info!("{:#?}", latency)
    }

    pub fn on_failure(error: ServerErrorsFailureClass, latency: Duration, _span: &Span) {
        tracing::error!("{} {:#?}", error, latency)
    }
}
