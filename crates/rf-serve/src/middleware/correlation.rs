use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use ulid::Ulid;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorrelationId(pub String);

pub const CORRELATION_HEADER: &str = "x-correlation-id";

fn incoming_id(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub async fn correlation_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = incoming_id(&request).unwrap_or_else(|| format!("req_{}", Ulid::new()));
    tracing::debug!(
        correlation_id = %id,
        method = %request.method(),
        uri = %request.uri(),
        "request received"
    );

    request.extensions_mut().insert(CorrelationId(id.clone()));
    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CORRELATION_HEADER), value);
    }
    response
}
