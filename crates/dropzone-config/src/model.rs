//! Configuration models.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Effective, validated client configuration.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ClientConfig {
    /// API origin.
    pub api_url: Url,
    /// Bearer token supplied by the auth collaborator.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Directory downloads are saved into.
    pub download_dir: PathBuf,
    /// Log filter directive.
    pub log_level: String,
    /// Log format override (`json` or `pretty`).
    pub log_format: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("download_dir", &self.download_dir)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

/// One configuration layer. Set fields override lower layers.
///
/// Also the on-disk JSON shape; unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigPatch {
    /// API origin.
    pub api_url: Option<String>,
    /// Bearer token.
    pub access_token: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Download directory.
    pub download_dir: Option<PathBuf>,
    /// Log filter directive.
    pub log_level: Option<String>,
    /// Log format.
    pub log_format: Option<String>,
}

impl ConfigPatch {
    /// Overlay `upper` on top of `self`.
    #[must_use]
    pub fn merge(self, upper: Self) -> Self {
        Self {
            api_url: upper.api_url.or(self.api_url),
            access_token: upper.access_token.or(self.access_token),
            timeout_secs: upper.timeout_secs.or(self.timeout_secs),
            download_dir: upper.download_dir.or(self.download_dir),
            log_level: upper.log_level.or(self.log_level),
            log_format: upper.log_format.or(self.log_format),
        }
    }
}
