//! Version/capability endpoint.
//!
//! Read-only status for probes and federation peers. Explicitly exempt
//! from network blocking (mounted outside the admission layer) so a
//! version check still works from otherwise-banned ranges, and always
//! CORS-open.

use axum::extract::State;
use axum::http::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN};
use axum::response::IntoResponse;
use axum::Json;

use crate::http::server::AppState;

pub async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"))],
        Json(serde_json::json!({
            "builder": state.builder_image,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
