//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), or built-in defaults
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EdgeConfig / WorkConfig (validated, immutable)
//!     → read once by lifecycle::startup to build every layer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    AppConfig, DelayConfig, DownstreamConfig, EdgeConfig, LogFormat, ObservabilityConfig,
    TimeoutConfig, TracerConfig, WorkConfig,
};
pub use validation::{Validate, ValidationError};
