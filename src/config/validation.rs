//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Required fields are present
//! - Enumerated values are known (env, log level)
//! - Addresses have `host:port` form
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Config → Result<(), ValidationErrors>
//! - Runs before config is accepted into the system

use std::fmt;

use crate::config::schema::{Config, ENVIRONMENTS};
use crate::debug::pprof::DEFAULT_PROFILE_WINDOW;
use crate::net::HostPort;
use crate::observability::Level;

/// A single violated constraint, attributed to a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. "servers.debug.addr").
    pub field: &'static str,
    /// Human-readable description of the violation.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every constraint a configuration value violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    /// Whether the given field has at least one violation.
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &Config) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    let env = config.global.env.as_str();
    if env.is_empty() {
        errors.push(ValidationError::new("global.env", "is required"));
    } else if !ENVIRONMENTS.contains(&env) {
        errors.push(ValidationError::new(
            "global.env",
            format!("must be one of {}, got {:?}", ENVIRONMENTS.join(" "), env),
        ));
    }

    let level = config.log.level.as_str();
    if level.is_empty() {
        errors.push(ValidationError::new("log.level", "is required"));
    } else if let Err(e) = level.parse::<Level>() {
        errors.push(ValidationError::new("log.level", e.to_string()));
    }

    let debug = &config.servers.debug;
    if debug.addr.is_empty() {
        errors.push(ValidationError::new("servers.debug.addr", "is required"));
    } else if let Err(e) = debug.addr.parse::<HostPort>() {
        errors.push(ValidationError::new("servers.debug.addr", e.to_string()));
    }
    if debug.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "servers.debug.shutdown_timeout_secs",
            "must be greater than zero",
        ));
    }
    if debug.request_timeout_secs <= DEFAULT_PROFILE_WINDOW.as_secs() {
        errors.push(ValidationError::new(
            "servers.debug.request_timeout_secs",
            format!(
                "must be greater than {} (default profile window)",
                DEFAULT_PROFILE_WINDOW.as_secs()
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}
