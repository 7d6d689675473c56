//! HTTP delivery subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, route wiring)
//!     → request.rs (request ID, response accounting)
//!     → middleware/headers.rs (default headers, allowed-hosts CORS echo)
//!     → middleware/admission.rs (the four-step pipeline)
//!     → handler (version, or the business-logic seam)
//!     → response.rs (rejection mapping, x-ratelimit-* metadata)
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod version;

pub use request::X_REQUEST_ID;
pub use response::{X_RATELIMIT_LIMIT, X_RATELIMIT_REMAINING, X_RATELIMIT_RESET};
pub use server::{AppState, GateServer};
