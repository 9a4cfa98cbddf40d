//! Local side effects triggered by the access gate.

use std::error::Error;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::DownloadPayload;

/// Where a downloaded payload ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    /// Final location of the saved file.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
}

/// Destination for downloaded payloads.
///
/// Implementations must release any staging resource they create on both the
/// success and failure paths.
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Persist `payload` under the suggested filename.
    async fn save(
        &self,
        suggested_name: &str,
        payload: &DownloadPayload,
    ) -> Result<SavedFile, Box<dyn Error + Send + Sync>>;
}

/// Isolation required for an external navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationIsolation {
    /// New browsing context with no opener handle and no referrer.
    NoOpenerNoReferrer,
}

impl NavigationIsolation {
    /// `rel` attribute value expressing this isolation for HTML-based openers.
    #[must_use]
    pub const fn rel(self) -> &'static str {
        match self {
            Self::NoOpenerNoReferrer => "noopener noreferrer",
        }
    }
}

/// Request to open an external link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalNavigation {
    /// Link to open.
    pub url: Url,
    /// Required isolation of the new context.
    pub isolation: NavigationIsolation,
}

impl ExternalNavigation {
    /// Navigation in a new, unprivileged context.
    #[must_use]
    pub const fn isolated(url: Url) -> Self {
        Self {
            url,
            isolation: NavigationIsolation::NoOpenerNoReferrer,
        }
    }
}

/// Failure reported by a link opener.
#[derive(Debug, Error)]
pub enum OpenError {
    /// The target refused the navigation (403-equivalent).
    #[error("navigation denied")]
    Denied {
        /// Optional detail.
        message: Option<String>,
    },
    /// The opener itself failed.
    #[error("failed to open link")]
    Failed {
        /// Underlying failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Hands external links to whatever presents them (browser, terminal, test recorder).
#[async_trait]
pub trait LinkOpener: Send + Sync {
    /// Open the navigation target honouring its isolation.
    async fn open(&self, navigation: &ExternalNavigation) -> Result<(), OpenError>;
}
