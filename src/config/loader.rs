//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::Config;
use crate::config::validation::{validate_config, ValidationErrors};

/// Error type for configuration loading.
///
/// Every variant carries the path so that a startup failure names the
/// file that caused it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parse {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validate {path:?}: {source}")]
    Validation {
        path: PathBuf,
        source: ValidationErrors,
    },
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_config(&content).map_err(|e| match e {
        ParseOrInvalid::Parse(source) => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ParseOrInvalid::Invalid(source) => ConfigError::Validation {
            path: path.to_path_buf(),
            source,
        },
    })
}

enum ParseOrInvalid {
    Parse(toml::de::Error),
    Invalid(ValidationErrors),
}

fn parse_config(content: &str) -> Result<Config, ParseOrInvalid> {
    let config: Config = toml::from_str(content).map_err(ParseOrInvalid::Parse)?;
    validate_config(&config).map_err(ParseOrInvalid::Invalid)?;
    Ok(config)
}
