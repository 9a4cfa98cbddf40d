//! Event payload types carried from the catalog engine to its views.

use chrono::{DateTime, Utc};

/// Identifier assigned to each event emitted by the engine.
pub type EventId = u64;

/// Identifier of a mounted view.
pub type ViewId = u64;

/// Default buffer size for the in-memory replay ring.
pub const DEFAULT_REPLAY_CAPACITY: usize = 256;

/// Stage of a bookmark toggle reported to views.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookmarkPhase {
    /// Local state was flipped before the remote call.
    Optimistic,
    /// Remote service acknowledged the toggle.
    Confirmed,
    /// Remote call failed and the prior state was restored.
    Reverted,
}

/// Typed catalog events surfaced to view projections.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A dashboard fetch settled successfully and replaced the view's snapshots.
    CatalogLoaded {
        /// View whose snapshots were replaced.
        view_id: ViewId,
        /// Number of released drops.
        released: usize,
        /// Number of upcoming drops.
        upcoming: usize,
        /// Number of bookmarked drops in the shared set.
        bookmarked: usize,
    },
    /// The shared bookmark set was replaced by a bookmarks-only fetch.
    BookmarksLoaded {
        /// View that requested the refresh.
        view_id: ViewId,
        /// Number of bookmarked drops.
        bookmarked: usize,
    },
    /// A detail fetch replaced the view's record.
    DetailLoaded {
        /// Detail view identifier.
        view_id: ViewId,
        /// Drop shown by the view.
        drop_id: String,
    },
    /// A fetch failed; the view keeps its previous data marked stale.
    CatalogStale {
        /// View whose data is now stale.
        view_id: ViewId,
        /// Collection whose call failed.
        collection: String,
    },
    /// A settled result was dropped because its view was torn down or superseded.
    UpdateDiscarded {
        /// View the result was meant for.
        view_id: ViewId,
        /// Operation whose result was discarded.
        operation: String,
    },
    /// Bookmark membership for a drop changed in every view holding it.
    BookmarkChanged {
        /// Drop whose bookmark state changed.
        drop_id: String,
        /// Bookmark state now visible to views.
        bookmarked: bool,
        /// Stage of the toggle protocol.
        phase: BookmarkPhase,
        /// Mounted views whose snapshots were touched.
        views: Vec<ViewId>,
    },
    /// A download transfer began.
    DownloadStarted {
        /// Drop being downloaded.
        drop_id: String,
    },
    /// A download was saved locally.
    DownloadCompleted {
        /// Drop that was downloaded.
        drop_id: String,
        /// Payload size in bytes.
        bytes: u64,
    },
    /// A download failed before the payload was saved.
    DownloadFailed {
        /// Drop that failed to download.
        drop_id: String,
        /// Short failure description.
        reason: String,
    },
    /// An external repository link was handed to the opener.
    ExternalOpened {
        /// Drop whose link was opened.
        drop_id: String,
    },
}

impl Event {
    /// Machine-friendly discriminator for subscribers and logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CatalogLoaded { .. } => "catalog_loaded",
            Self::BookmarksLoaded { .. } => "bookmarks_loaded",
            Self::DetailLoaded { .. } => "detail_loaded",
            Self::CatalogStale { .. } => "catalog_stale",
            Self::UpdateDiscarded { .. } => "update_discarded",
            Self::BookmarkChanged { .. } => "bookmark_changed",
            Self::DownloadStarted { .. } => "download_started",
            Self::DownloadCompleted { .. } => "download_completed",
            Self::DownloadFailed { .. } => "download_failed",
            Self::ExternalOpened { .. } => "external_opened",
        }
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    /// Monotonic identifier assigned to the wrapped event.
    pub id: EventId,
    /// Timestamp recording when the envelope was produced.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event payload.
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_maps_catalog_variants() {
        assert_event_kind(
            &Event::CatalogLoaded {
                view_id: 1,
                released: 2,
                upcoming: 1,
                bookmarked: 0,
            },
            "catalog_loaded",
        );
        assert_event_kind(
            &Event::CatalogStale {
                view_id: 1,
                collection: "upcoming".into(),
            },
            "catalog_stale",
        );
        assert_event_kind(
            &Event::BookmarkChanged {
                drop_id: "d1".into(),
                bookmarked: true,
                phase: BookmarkPhase::Optimistic,
                views: vec![1, 2],
            },
            "bookmark_changed",
        );
        assert_event_kind(
            &Event::DownloadCompleted {
                drop_id: "d1".into(),
                bytes: 12,
            },
            "download_completed",
        );
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::BookmarkChanged {
            drop_id: "7".into(),
            bookmarked: false,
            phase: BookmarkPhase::Reverted,
            views: vec![3],
        };
        let text = serde_json::to_string(&event).unwrap_or_default();
        assert!(text.contains(r#""type":"bookmark_changed""#));
        assert!(text.contains(r#""phase":"reverted""#));
    }

    fn assert_event_kind(event: &Event, expected: &str) {
        assert_eq!(event.kind(), expected);
    }
}
