//! Cross-cutting HTTP layers.

use std::any::Any;
use std::time::Duration;

use axum::{
    extract::Request,
    http::{HeaderName, Method, StatusCode},
    middleware::map_response,
    response::{IntoResponse, Response},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::AppError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Preflight cache lifetime (24h)
const CORS_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Wrap `router` with request id, tracing, CORS, panic recovery and timeout.
///
/// Layers run top to bottom on the way in, so every log line inside the
/// trace span already carries the request id.
pub fn apply(router: Router, request_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_span)
                    .on_response(DefaultOnResponse::new().level(Level::INFO)),
            )
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(cors_layer())
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(map_response(timeout_as_json))
            .layer(TimeoutLayer::new(request_timeout)),
    )
}

fn make_span(request: &Request) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

/// Permissive CORS for browser clients.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(AnyOrigin)
        .max_age(CORS_MAX_AGE)
}

/// `TimeoutLayer` answers with an empty 408; give it the regular error body.
async fn timeout_as_json(response: Response) -> Response {
    if response.status() == StatusCode::REQUEST_TIMEOUT {
        tracing::warn!("request exceeded its time budget");
        return AppError::Timeout.into_response();
    }
    response
}

/// Turn a handler panic into the regular `internal_error` body.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    AppError::internal(format!("handler panicked: {}", detail)).into_response()
}
