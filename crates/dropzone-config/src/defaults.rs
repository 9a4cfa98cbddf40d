//! Built-in defaults and environment variable names.

/// API origin used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
/// Request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Largest accepted timeout in seconds.
pub const MAX_TIMEOUT_SECS: u64 = 300;
/// Directory downloads are saved into.
pub const DEFAULT_DOWNLOAD_DIR: &str = ".";
/// Log filter used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Path of an optional JSON configuration file.
pub const ENV_CONFIG: &str = "DROPZONE_CONFIG";
/// API origin.
pub const ENV_API_URL: &str = "DROPZONE_API_URL";
/// Bearer token.
pub const ENV_TOKEN: &str = "DROPZONE_TOKEN";
/// Request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "DROPZONE_HTTP_TIMEOUT_SECS";
/// Download directory.
pub const ENV_DOWNLOAD_DIR: &str = "DROPZONE_DOWNLOAD_DIR";
/// Log filter.
pub const ENV_LOG_LEVEL: &str = "DROPZONE_LOG_LEVEL";
/// Log format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "DROPZONE_LOG_FORMAT";
