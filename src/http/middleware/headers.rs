//! Default response headers and allowed-hosts CORS echo.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::{HeaderMap, HeaderName, HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::config::CorsConfig;
use crate::http::server::AppState;

/// Apply operator-configured default headers to every gated response, and
/// echo the request `Origin` back when its host is on the allow list.
pub async fn default_headers_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin_echo = allowed_origin(&state.cors, request.headers());

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    for (name, value) in &state.cors.default_headers {
        match (
            name.parse::<HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                tracing::warn!(header = %name, "Skipping unrepresentable default header");
            }
        }
    }

    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("cache-control"),
    );

    if let Some(origin) = origin_echo {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    }

    response
}

/// The request Origin, verbatim, when its host (port stripped) is allowed.
fn allowed_origin(cors: &CorsConfig, headers: &HeaderMap) -> Option<HeaderValue> {
    if cors.allowed_hosts.is_empty() {
        return None;
    }
    let origin = headers.get(ORIGIN)?;
    let parsed = url::Url::parse(origin.to_str().ok()?).ok()?;
    let host = parsed.host_str()?;
    if cors.allowed_hosts.iter().any(|allowed| allowed == host) {
        Some(origin.clone())
    } else {
        None
    }
}
