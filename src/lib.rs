//! Request-admission gate for an on-demand build/serve platform.
//!
//! Every inbound request passes three checks, in order, before it reaches
//! business logic: network block list, build-token verification, and
//! per-client rate limiting. The checks are plain types under [`security`],
//! composed by [`admission::AdmissionPipeline`] and mounted as axum
//! middleware by [`http::GateServer`].

// Core subsystems
pub mod admission;
pub mod config;
pub mod http;
pub mod security;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use admission::AdmissionPipeline;
pub use config::GateConfig;
pub use http::GateServer;
pub use lifecycle::Shutdown;
