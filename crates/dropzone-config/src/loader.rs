//! Layered loading: defaults, then file, then environment, then overrides.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults::{
    ENV_API_URL, ENV_CONFIG, ENV_DOWNLOAD_DIR, ENV_LOG_FORMAT, ENV_LOG_LEVEL, ENV_TIMEOUT_SECS,
    ENV_TOKEN,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ClientConfig, ConfigPatch};
use crate::validate::{parse_timeout_text, resolve};

/// Builder assembling a [`ClientConfig`] from its layers.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    overrides: ConfigPatch,
}

impl ConfigLoader {
    /// Loader with no explicit file and no overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this JSON file instead of the one named by `DROPZONE_CONFIG`.
    #[must_use]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Highest-precedence layer, typically command-line flags.
    #[must_use]
    pub fn overrides(mut self, patch: ConfigPatch) -> Self {
        self.overrides = patch;
        self
    }

    /// Load using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or a
    /// field fails validation.
    pub fn load(&self) -> ConfigResult<ClientConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Load using `env` as the environment lookup.
    ///
    /// # Errors
    ///
    /// See [`ConfigLoader::load`].
    pub fn load_with_env<F>(&self, env: F) -> ConfigResult<ClientConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let file_path = self
            .file
            .clone()
            .or_else(|| lookup(ENV_CONFIG).map(PathBuf::from));
        let file_layer = match file_path {
            Some(path) => read_file(&path)?,
            None => ConfigPatch::default(),
        };

        let env_layer = ConfigPatch {
            api_url: lookup(ENV_API_URL),
            access_token: lookup(ENV_TOKEN),
            timeout_secs: lookup(ENV_TIMEOUT_SECS)
                .map(|raw| parse_timeout_text(&raw))
                .transpose()?,
            download_dir: lookup(ENV_DOWNLOAD_DIR).map(PathBuf::from),
            log_level: lookup(ENV_LOG_LEVEL),
            log_format: lookup(ENV_LOG_FORMAT),
        };

        let merged = file_layer
            .merge(env_layer)
            .merge(self.overrides.clone());
        let config = resolve(merged)?;
        debug!(
            api_url = %config.api_url,
            timeout_secs = config.timeout.as_secs(),
            authenticated = config.access_token.is_some(),
            "client configuration loaded"
        );
        Ok(config)
    }
}

/// Parse a JSON configuration file.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
pub fn read_file(path: &Path) -> ConfigResult<ConfigPatch> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
