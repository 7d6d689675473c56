//! Middleware applied to gated routes.

pub mod admission;
pub mod headers;

pub use admission::admission_middleware;
pub use headers::default_headers_middleware;
