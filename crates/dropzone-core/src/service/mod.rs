//! Remote-service contract and the local side-effect seams used by the access gate.

mod effects;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};
use crate::model::{DropId, DropRecord};

pub use effects::{
    ExternalNavigation, FileSink, LinkOpener, NavigationIsolation, OpenError, SavedFile,
};

/// Acknowledgement of a bookmark toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ToggleAck {
    /// New state when the service reported one (201 created vs 200 removed).
    pub bookmarked: Option<bool>,
}

/// Buffered download body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadPayload {
    /// Full response body.
    pub body: Vec<u8>,
    /// Media type reported by the service.
    pub content_type: Option<String>,
    /// Filename from `Content-Disposition`, when present.
    pub filename: Option<String>,
}

impl DownloadPayload {
    /// Body size in bytes.
    #[must_use]
    pub fn len(&self) -> u64 {
        u64::try_from(self.body.len()).unwrap_or(u64::MAX)
    }

    /// Whether the body is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Health probe response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status keyword (`healthy` when up).
    pub status: String,
    /// Free-form message.
    #[serde(default)]
    pub message: Option<String>,
}

/// Remote drop service consumed by the catalog engine.
///
/// Implementations attach the session's auth context to every call.
#[async_trait]
pub trait DropService: Send + Sync {
    /// Released drops in service order.
    async fn released_drops(&self) -> ServiceResult<Vec<DropRecord>>;

    /// Upcoming drops in service order.
    async fn upcoming_drops(&self) -> ServiceResult<Vec<DropRecord>>;

    /// Drops bookmarked by the current user.
    async fn bookmarked_drops(&self) -> ServiceResult<Vec<DropRecord>>;

    /// Single drop by id.
    async fn drop_by_id(&self, id: &DropId) -> ServiceResult<DropRecord>;

    /// Flip the bookmark relationship for a drop.
    async fn toggle_bookmark(&self, id: &DropId) -> ServiceResult<ToggleAck>;

    /// Fetch the drop's file attachment.
    async fn download(&self, id: &DropId) -> ServiceResult<DownloadPayload>;

    /// Probe service health; default implementation reports lack of support.
    async fn health(&self) -> ServiceResult<HealthStatus> {
        Err(ServiceError::Unsupported {
            operation: "health",
        })
    }
}
