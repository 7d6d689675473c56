//! Admission middleware for gated routes.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::admission::AdmissionRequest;
use crate::http::response::apply_rate_limit_headers;
use crate::http::server::AppState;

/// Run the full admission pipeline before the handler.
///
/// Rejections short-circuit with the pipeline's terminal response. Admitted
/// requests carry their [`crate::admission::Admission`] in the request
/// extensions, and counted requests get `x-ratelimit-*` response headers.
pub async fn admission_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().map(str::to_string);

    let result = {
        let admission_request = AdmissionRequest {
            remote_ip: addr.ip(),
            headers: request.headers(),
            path: &path,
            query: query.as_deref(),
            skip_network_check: false,
        };
        state.pipeline.admit(&admission_request)
    };

    match result {
        Ok(admission) => {
            let rate_limit = admission.rate_limit;
            request.extensions_mut().insert(admission);
            let mut response = next.run(request).await;
            if let Some(info) = rate_limit {
                apply_rate_limit_headers(response.headers_mut(), &info);
            }
            response
        }
        Err(rejection) => rejection.into_response(),
    }
}
