//! Field validation for assembled configuration.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::defaults::{
    DEFAULT_API_URL, DEFAULT_DOWNLOAD_DIR, DEFAULT_LOG_LEVEL, DEFAULT_TIMEOUT_SECS,
    MAX_TIMEOUT_SECS,
};
use crate::error::{ConfigError, ConfigResult};
use crate::model::{ClientConfig, ConfigPatch};

/// Resolve a merged patch into a validated configuration, filling defaults.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for the first field that fails.
pub fn resolve(patch: ConfigPatch) -> ConfigResult<ClientConfig> {
    let api_url = parse_api_url(patch.api_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
    let timeout = parse_timeout(patch.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))?;
    let download_dir = patch
        .download_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));
    if download_dir.as_os_str().is_empty() {
        return Err(ConfigError::InvalidField {
            field: "download_dir",
            reason: "must not be empty",
            value: None,
        });
    }
    let log_level = patch
        .log_level
        .map(|level| level.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    if log_level.is_empty() {
        return Err(ConfigError::InvalidField {
            field: "log_level",
            reason: "must not be empty",
            value: None,
        });
    }
    let log_format = patch.log_format.map(parse_log_format).transpose()?;
    let access_token = patch
        .access_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    Ok(ClientConfig {
        api_url,
        access_token,
        timeout,
        download_dir,
        log_level,
        log_format,
    })
}

/// Parse an absolute http(s) API origin.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for unparsable or non-http URLs.
pub fn parse_api_url(raw: &str) -> ConfigResult<Url> {
    let invalid = |reason| ConfigError::InvalidField {
        field: "api_url",
        reason,
        value: Some(raw.to_string()),
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid("must be an absolute URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("must use http or https"));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("must include a host"));
    }
    Ok(url)
}

/// Check the timeout bounds.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] outside `1..=300` seconds.
pub fn parse_timeout(secs: u64) -> ConfigResult<Duration> {
    if (1..=MAX_TIMEOUT_SECS).contains(&secs) {
        Ok(Duration::from_secs(secs))
    } else {
        Err(ConfigError::InvalidField {
            field: "timeout_secs",
            reason: "must be between 1 and 300",
            value: Some(secs.to_string()),
        })
    }
}

/// Parse a timeout given as text (environment variables).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] for non-integers.
pub fn parse_timeout_text(raw: &str) -> ConfigResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidField {
            field: "timeout_secs",
            reason: "must be an integer",
            value: Some(raw.to_string()),
        })
}

fn parse_log_format(raw: String) -> ConfigResult<String> {
    let normalised = raw.trim().to_ascii_lowercase();
    match normalised.as_str() {
        "json" | "pretty" => Ok(normalised),
        _ => Err(ConfigError::InvalidField {
            field: "log_format",
            reason: "must be 'json' or 'pretty'",
            value: Some(raw),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_empty_patch() -> anyhow::Result<()> {
        let config = resolve(ConfigPatch::default())?;
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.download_dir, PathBuf::from("."));
        assert_eq!(config.log_level, "info");
        assert!(config.access_token.is_none());
        Ok(())
    }

    #[test]
    fn rejects_bad_urls() {
        for raw in ["ftp://drops.example.com", "not a url", "mailto:ops@example.com"] {
            assert!(matches!(
                parse_api_url(raw),
                Err(ConfigError::InvalidField {
                    field: "api_url",
                    ..
                })
            ));
        }
    }

    #[test]
    fn timeout_bounds() {
        assert!(parse_timeout(0).is_err());
        assert!(parse_timeout(301).is_err());
        assert_eq!(parse_timeout(300).ok(), Some(Duration::from_secs(300)));
        assert!(parse_timeout_text("ten").is_err());
    }

    #[test]
    fn blank_token_is_absent_and_format_normalised() -> anyhow::Result<()> {
        let config = resolve(ConfigPatch {
            access_token: Some("   ".into()),
            log_format: Some("JSON".into()),
            ..ConfigPatch::default()
        })?;
        assert!(config.access_token.is_none());
        assert_eq!(config.log_format.as_deref(), Some("json"));
        assert!(
            resolve(ConfigPatch {
                log_format: Some("xml".into()),
                ..ConfigPatch::default()
            })
            .is_err()
        );
        Ok(())
    }
}
