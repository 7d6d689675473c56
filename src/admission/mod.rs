//! Admission orchestration.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → pipeline.rs step 1: network block list (403 on match)
//!     → pipeline.rs step 2: identity resolution (identity.rs collaborator)
//!     → pipeline.rs step 3: build token check (403 if present-but-invalid)
//!     → pipeline.rs step 4: rate limit (429, skipped for trusted callers)
//!     → Allowed: identity + token status attached to the request
//! ```
//!
//! # Design Decisions
//! - The pipeline is explicit composition, not a handler hierarchy: it
//!   holds its three checks plus the identity resolver and invokes them in
//!   a fixed sequence
//! - Every failure is terminal for the request; nothing is retried

pub mod identity;
pub mod pipeline;

pub use identity::{Identity, IdentityResolver, NullResolver, TrustedHeaderResolver};
pub use pipeline::{
    spec_from_path, Admission, AdmissionError, AdmissionPipeline, AdmissionRequest,
    BUILD_TOKEN_HEADER, BUILD_TOKEN_PARAM,
};
