//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (field-attributed semantic checks)
//!     → Config (validated, immutable)
//!     → consumed once by the supervisor at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Required fields have empty defaults so validation sees all of them
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{Config, DebugServerConfig, GlobalConfig, LogConfig, ServersConfig};
pub use validation::{validate_config, ValidationError, ValidationErrors};
