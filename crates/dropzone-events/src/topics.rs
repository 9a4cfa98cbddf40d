//! Audience helpers deciding which view an event concerns.

use crate::payloads::{Event, ViewId};

/// Machine-friendly discriminator for subscribers and logs.
#[must_use]
pub const fn event_kind(event: &Event) -> &'static str {
    event.kind()
}

/// Whether a view should re-render for this event.
///
/// Bookmark changes concern every view because the bookmark set is shared;
/// fetch outcomes concern only the view that issued the fetch. Download and
/// open notifications concern whoever shows the drop, so they are broadcast.
#[must_use]
pub fn concerns_view(event: &Event, view: ViewId) -> bool {
    match event {
        Event::CatalogLoaded { view_id, .. }
        | Event::DetailLoaded { view_id, .. }
        | Event::CatalogStale { view_id, .. }
        | Event::UpdateDiscarded { view_id, .. } => *view_id == view,
        Event::BookmarksLoaded { .. }
        | Event::BookmarkChanged { .. }
        | Event::DownloadStarted { .. }
        | Event::DownloadCompleted { .. }
        | Event::DownloadFailed { .. }
        | Event::ExternalOpened { .. } => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payloads::BookmarkPhase;

    #[test]
    fn fetch_outcomes_are_view_scoped() {
        let loaded = Event::CatalogLoaded {
            view_id: 4,
            released: 0,
            upcoming: 0,
            bookmarked: 0,
        };
        assert!(concerns_view(&loaded, 4));
        assert!(!concerns_view(&loaded, 5));
        assert_eq!(event_kind(&loaded), "catalog_loaded");
    }

    #[test]
    fn bookmark_changes_reach_every_view() {
        let changed = Event::BookmarkChanged {
            drop_id: "d1".into(),
            bookmarked: true,
            phase: BookmarkPhase::Confirmed,
            views: vec![1],
        };
        assert!(concerns_view(&changed, 1));
        assert!(concerns_view(&changed, 99));
    }
}
