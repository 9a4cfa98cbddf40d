//! Session context shared by command handlers, plus CLI error types.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use anyhow::anyhow;
use dropzone_catalog::{Catalog, DirectorySink};
use dropzone_client::{ClientOptions, HttpDropService};
use dropzone_config::ClientConfig;
use dropzone_core::{CatalogError, DropService};

use crate::cli::OutputFormat;
use crate::opener::{LaunchMode, SystemOpener};

/// CLI-level error type to distinguish validation from operational failures.
#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<CatalogError> for CliError {
    fn from(err: CatalogError) -> Self {
        let message = err.user_message();
        if err.is_caller_error() {
            tracing::debug!(error = %err, "command rejected");
            Self::Validation(message)
        } else {
            tracing::warn!(error = %err, retryable = err.is_retryable(), "command failed");
            Self::Failure(anyhow::Error::new(err).context(message))
        }
    }
}

/// Application context passed to command handlers.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub(crate) catalog: Catalog,
    pub(crate) service: Arc<HttpDropService>,
    pub(crate) access_token: Option<String>,
    pub(crate) output: OutputFormat,
    pub(crate) launch_mode: LaunchMode,
}

impl AppContext {
    /// Wire the HTTP service, download directory, and opener into one catalog.
    pub(crate) fn new(
        config: &ClientConfig,
        request_id: &str,
        output: OutputFormat,
        launch_mode: LaunchMode,
    ) -> CliResult<Self> {
        let service = HttpDropService::new(ClientOptions {
            base_url: config.api_url.clone(),
            access_token: config.access_token.clone(),
            timeout: config.timeout,
            request_id: Some(request_id.to_string()),
        })
        .map_err(|err| CliError::failure(anyhow!(err).context("failed to build HTTP client")))?;
        let service = Arc::new(service);
        let remote: Arc<dyn DropService> = service.clone();

        let catalog = Catalog::builder(remote).build(
            Arc::new(DirectorySink::new(config.download_dir.clone())),
            Arc::new(SystemOpener::new(launch_mode)),
        );

        Ok(Self {
            catalog,
            service,
            access_token: config.access_token.clone(),
            output,
            launch_mode,
        })
    }
}
