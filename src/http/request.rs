//! Request identification and accounting.

use axum::body::Body;
use axum::http::header::HeaderValue;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Stamp every request and response with an `x-request-id`, preserving an
/// inbound one, and count the response for metrics.
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&id) {
        request.headers_mut().insert(X_REQUEST_ID, value.clone());
        let method = request.method().to_string();

        let mut response = next.run(request).await;
        metrics::record_request(&method, response.status().as_u16());
        response.headers_mut().insert(X_REQUEST_ID, value);
        return response;
    }

    next.run(request).await
}
