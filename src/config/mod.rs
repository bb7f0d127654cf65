//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ResilienceConfig (validated, immutable)
//!     → Pipeline::from_config / HyperTransport::new / DemoServer::new
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; pipelines are built once from it
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DemoConfig, ObservabilityConfig, ResilienceConfig, RetryConfig, TimeoutConfig,
    TransportConfig,
};
pub use validation::{validate_config, ValidationError};
