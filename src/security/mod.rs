//! Security subsystem: the three admission checks.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → block_list.rs (banned network ranges, longest prefix wins)
//!     → build_token.rs (signed token binding origin to resource spec)
//!     → rate_limit.rs (per-client fixed-window counting)
//!     → Pass to business logic
//! ```
//!
//! # Design Decisions
//! - Fail closed on policy: a matching ban or an invalid token rejects
//! - Fail open on malformed request input: unparseable addresses never
//!   match, they also never crash the pipeline
//! - Rule set and signing secret are read-only after startup

pub mod block_list;
pub mod build_token;
pub mod rate_limit;

pub use block_list::{NetworkBlockList, NetworkRule};
pub use build_token::{request_origin, BuildTokenClaims, BuildTokenVerifier, TokenError};
pub use rate_limit::{RateLimitExceeded, RateLimitInfo, RateLimiter};
