//! Error types for remote calls and catalog operations.
//!
//! # Design
//! - Constant messages; context lives in fields so logs stay filterable.
//! - `ServiceError` describes what the remote collaborator did.
//! - `CatalogError` is the typed outcome a view receives from the engine.

use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;
use thiserror::Error;

use crate::model::DropId;

/// Result alias for remote-service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result alias for catalog engine operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failures reported by the remote drop service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Authentication or entitlement was rejected (401/403).
    #[error("access denied by drop service")]
    AccessDenied {
        /// Remote operation identifier.
        operation: &'static str,
        /// Message returned by the service, when any.
        message: Option<String>,
    },
    /// The addressed drop or file does not exist (404).
    #[error("resource not found")]
    NotFound {
        /// Remote operation identifier.
        operation: &'static str,
    },
    /// Connectivity failure before a response was read.
    #[error("drop service unreachable")]
    Transient {
        /// Remote operation identifier.
        operation: &'static str,
        /// Underlying transport failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// Any other non-success status.
    #[error("drop service returned an error status")]
    Status {
        /// Remote operation identifier.
        operation: &'static str,
        /// HTTP status code.
        status: u16,
        /// Message returned by the service.
        message: String,
    },
    /// Response body could not be decoded.
    #[error("drop service response could not be decoded")]
    Decode {
        /// Remote operation identifier.
        operation: &'static str,
        /// Underlying decode failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The service implementation does not offer this operation.
    #[error("operation not supported by drop service")]
    Unsupported {
        /// Remote operation identifier.
        operation: &'static str,
    },
}

impl ServiceError {
    /// Remote operation the failure belongs to.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::AccessDenied { operation, .. }
            | Self::NotFound { operation }
            | Self::Transient { operation, .. }
            | Self::Status { operation, .. }
            | Self::Decode { operation, .. }
            | Self::Unsupported { operation } => operation,
        }
    }
}

/// Catalog collection fetched from the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Released drops.
    Released,
    /// Upcoming drops.
    Upcoming,
    /// The user's bookmarked drops.
    Bookmarked,
    /// A single drop by id.
    Detail,
}

impl Collection {
    /// Stable name used in logs and events.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Released => "released",
            Self::Upcoming => "upcoming",
            Self::Bookmarked => "bookmarked",
            Self::Detail => "detail",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Typed outcome of a failed catalog operation.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog fetch failed; no snapshot was replaced.
    #[error("catalog fetch failed")]
    CatalogFetch {
        /// First collection whose call failed.
        collection: Collection,
        /// Remote failure.
        #[source]
        source: ServiceError,
    },
    /// A bookmark toggle failed remotely; local state has already been reverted.
    #[error("bookmark update failed")]
    BookmarkSync {
        /// Drop whose toggle failed.
        drop_id: DropId,
        /// Remote failure.
        #[source]
        source: ServiceError,
    },
    /// Entitlement or authentication rejected a download or open.
    #[error("access denied")]
    AccessDenied {
        /// Drop the action targeted.
        drop_id: DropId,
        /// Message returned by the service, when any.
        message: Option<String>,
    },
    /// The drop no longer exists remotely.
    #[error("drop not found")]
    NotFound {
        /// Missing drop identifier.
        drop_id: DropId,
    },
    /// Connectivity failure; no state change was kept.
    #[error("network unavailable")]
    TransientNetwork {
        /// Engine operation identifier.
        operation: &'static str,
        /// Remote failure.
        #[source]
        source: ServiceError,
    },
    /// The service rejected the call for another reason.
    #[error("drop service rejected the request")]
    Remote {
        /// Engine operation identifier.
        operation: &'static str,
        /// Remote failure.
        #[source]
        source: ServiceError,
    },
    /// The caller asked for something the drop does not allow.
    #[error("operation not permitted for this drop")]
    ContractViolation {
        /// Engine operation identifier.
        operation: &'static str,
        /// Drop the operation targeted.
        drop_id: DropId,
        /// Static reason for the rejection.
        reason: &'static str,
    },
    /// A toggle for the same drop is still awaiting the service.
    #[error("bookmark update already in progress")]
    ToggleInFlight {
        /// Drop with an outstanding toggle.
        drop_id: DropId,
    },
    /// The downloaded payload could not be saved locally.
    #[error("failed to save download")]
    Save {
        /// Drop whose payload failed to save.
        drop_id: DropId,
        /// Underlying sink failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The link opener failed for a reason other than denial.
    #[error("failed to open external link")]
    OpenFailed {
        /// Drop whose link failed to open.
        drop_id: DropId,
        /// Underlying opener failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A background task running the operation panicked or was aborted.
    #[error("catalog task aborted")]
    TaskAborted {
        /// Engine operation identifier.
        operation: &'static str,
    },
}

impl CatalogError {
    /// Map a remote failure of a download or open into the engine taxonomy.
    #[must_use]
    pub fn from_access(operation: &'static str, drop_id: &DropId, source: ServiceError) -> Self {
        match source {
            ServiceError::AccessDenied { message, .. } => Self::AccessDenied {
                drop_id: drop_id.clone(),
                message,
            },
            ServiceError::NotFound { .. } => Self::NotFound {
                drop_id: drop_id.clone(),
            },
            ServiceError::Transient { .. } => Self::TransientNetwork { operation, source },
            other => Self::Remote {
                operation,
                source: other,
            },
        }
    }

    /// Whether the caller broke a precondition, as opposed to a runtime failure.
    #[must_use]
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::ContractViolation { .. } | Self::ToggleInFlight { .. }
        )
    }

    /// Whether offering a manual retry makes sense.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::CatalogFetch { source, .. }
            | Self::BookmarkSync { source, .. }
            | Self::Remote { source, .. } => matches!(
                source,
                ServiceError::Transient { .. } | ServiceError::Status { .. }
            ),
            Self::TransientNetwork { .. }
            | Self::ToggleInFlight { .. }
            | Self::Save { .. }
            | Self::OpenFailed { .. } => true,
            Self::AccessDenied { .. }
            | Self::NotFound { .. }
            | Self::ContractViolation { .. }
            | Self::TaskAborted { .. } => false,
        }
    }

    /// Short user-facing description, including the remote message when one exists.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CatalogFetch { collection, .. } => {
                format!("Failed to load {collection} drops. Please try again.")
            }
            Self::BookmarkSync { .. } => "Failed to update bookmark. Please try again.".into(),
            Self::AccessDenied { message, .. } => message
                .clone()
                .unwrap_or_else(|| "You do not have access to this drop.".into()),
            Self::NotFound { drop_id } => {
                format!("Drop {drop_id} doesn't exist or has been removed.")
            }
            Self::TransientNetwork { .. } => "Network unavailable. Please try again.".into(),
            Self::Remote { source, .. } => match source {
                ServiceError::Status {
                    status, message, ..
                } => format!("{message} (status {status})"),
                other => other.to_string(),
            },
            Self::ContractViolation { reason, .. } => (*reason).to_string(),
            Self::ToggleInFlight { .. } => "A bookmark update is already in progress.".into(),
            Self::Save { source, .. } => format!("Failed to save file: {source}"),
            Self::OpenFailed { source, .. } => format!("Failed to open link: {source}"),
            Self::TaskAborted { .. } => "The operation was interrupted.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn transient() -> ServiceError {
        ServiceError::Transient {
            operation: "download",
            source: Box::new(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
        }
    }

    #[test]
    fn access_failures_map_to_taxonomy() {
        let id = DropId::from("d1");
        let denied = CatalogError::from_access(
            "download",
            &id,
            ServiceError::AccessDenied {
                operation: "download",
                message: Some("This drop is not yet released.".into()),
            },
        );
        assert!(matches!(denied, CatalogError::AccessDenied { .. }));
        assert_eq!(denied.user_message(), "This drop is not yet released.");

        let missing = CatalogError::from_access(
            "download",
            &id,
            ServiceError::NotFound {
                operation: "download",
            },
        );
        assert!(matches!(missing, CatalogError::NotFound { .. }));

        let offline = CatalogError::from_access("download", &id, transient());
        assert!(matches!(offline, CatalogError::TransientNetwork { .. }));
        assert!(offline.is_retryable());
    }

    #[test]
    fn caller_errors_are_not_retryable_failures() {
        let violation = CatalogError::ContractViolation {
            operation: "download",
            drop_id: DropId::from("d1"),
            reason: "drop has no file attached",
        };
        assert!(violation.is_caller_error());
        assert!(!violation.is_retryable());
        assert_eq!(violation.to_string(), "operation not permitted for this drop");
    }

    #[test]
    fn service_error_exposes_operation() {
        assert_eq!(transient().operation(), "download");
        assert_eq!(
            ServiceError::Unsupported { operation: "health" }.operation(),
            "health"
        );
    }
}
