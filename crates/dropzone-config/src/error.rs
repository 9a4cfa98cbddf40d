//! Configuration errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Structured errors emitted while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Field contained an invalid value.
    #[error("invalid configuration value")]
    InvalidField {
        /// Field that failed validation.
        field: &'static str,
        /// Static description of the constraint.
        reason: &'static str,
        /// Offending value; omitted for secrets.
        value: Option<String>,
    },
    /// The configuration file could not be read.
    #[error("failed to read configuration file")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration file is not valid JSON or has unknown keys.
    #[error("failed to parse configuration file")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// One-line description including the field context.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::InvalidField {
                field,
                reason,
                value: Some(value),
            } => format!("{field} {reason} (got '{value}')"),
            Self::InvalidField { field, reason, .. } => format!("{field} {reason}"),
            Self::Io { path, source } => {
                format!("cannot read {}: {source}", path.display())
            }
            Self::Parse { path, source } => {
                format!("cannot parse {}: {source}", path.display())
            }
        }
    }
}
