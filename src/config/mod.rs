//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable for the process lifetime; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Malformed CIDR blocks and a missing token secret are startup errors,
//!   never per-request ones

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, BanNetworkConfig, BuildTokenConfig, BuilderConfig, CorsConfig, GateConfig,
    ListenerConfig, ObservabilityConfig, RateLimitConfig,
};
pub use validation::{validate_config, ValidationError};
