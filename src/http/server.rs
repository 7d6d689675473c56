//! HTTP server setup and wiring.
//!
//! # Responsibilities
//! - Create the axum Router with gated and exempt routes
//! - Wire up middleware (tracing, request ID, admission, default headers)
//! - Serve with graceful shutdown
//!
//! The admission layer wraps only the gated routes; the version endpoint
//! is mounted beside them, which is the explicit, enumerated opt-out from
//! network blocking.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::admission::{spec_from_path, Admission, AdmissionPipeline};
use crate::config::{CorsConfig, GateConfig};
use crate::http::middleware::{admission_middleware, default_headers_middleware};
use crate::http::request::request_id_middleware;
use crate::http::version::version_handler;
use crate::security::block_list::BlockListError;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AdmissionPipeline>,
    pub builder_image: String,
    pub cors: CorsConfig,
    pub spec_prefix: String,
}

/// HTTP server for the admission gate.
pub struct GateServer {
    router: Router,
    config: GateConfig,
}

impl GateServer {
    /// Create a new server from validated configuration.
    pub fn new(config: GateConfig) -> Result<Self, BlockListError> {
        let pipeline = Arc::new(AdmissionPipeline::from_config(&config)?);

        let state = AppState {
            pipeline,
            builder_image: config.builder.image.clone(),
            cors: config.cors.clone(),
            spec_prefix: config.build_token.spec_prefix.clone(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        // The admission layer is innermost so its rejections still pick up
        // the default headers on the way out.
        let gated = Router::new()
            .route(
                &format!("{}/{{*spec}}", config.build_token.spec_prefix),
                any(build_handler),
            )
            .layer(middleware::from_fn_with_state(
                state.clone(),
                admission_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                default_headers_middleware,
            ));

        Router::new()
            .route("/version", get(version_handler))
            .merge(gated)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(middleware::from_fn(request_id_middleware)),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admission gate listening");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

/// Hand-off seam to the build orchestration behind the gate.
///
/// Everything up to here is the admission contract; what runs a build is a
/// separate component consuming the admitted context from the request
/// extensions. This handler reports that context back.
async fn build_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let admission = request.extensions().get::<Admission>().cloned();
    let spec = spec_from_path(request.uri().path(), &state.spec_prefix).unwrap_or_default();

    Json(serde_json::json!({
        "spec": spec,
        "identity": admission
            .as_ref()
            .and_then(|a| a.identity.as_ref())
            .map(|i| i.name().to_string()),
        "build_token": admission.map(|a| a.has_valid_build_token).unwrap_or(false),
    }))
    .into_response()
}
