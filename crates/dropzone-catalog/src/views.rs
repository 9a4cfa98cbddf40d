//! View handles and the projections views render from.
//!
//! A handle keeps its view mounted; dropping it unmounts the view, after which
//! results of fetches it issued are discarded. Projections are pure functions
//! of a [`ViewSnapshot`] plus the observation time.

use chrono::{DateTime, Utc};
use dropzone_core::{DropId, DropRecord, Release};
use dropzone_events::{EventEnvelope, EventStream, ViewId, concerns_view};
use serde::Serialize;

use crate::store::{CatalogStore, Freshness, ViewKind, ViewSnapshot};

/// Number of bookmarks previewed on the dashboard.
pub const BOOKMARK_PREVIEW_LEN: usize = 4;

/// Keeps a view mounted while alive.
#[derive(Debug)]
pub struct ViewHandle {
    view_id: ViewId,
    store: CatalogStore,
}

impl ViewHandle {
    pub(crate) fn mount(store: &CatalogStore, kind: ViewKind) -> Self {
        Self {
            view_id: store.mount(kind),
            store: store.clone(),
        }
    }

    /// View identifier.
    #[must_use]
    pub const fn id(&self) -> ViewId {
        self.view_id
    }

    /// Copy of the view's data.
    #[must_use]
    pub fn snapshot(&self) -> Option<ViewSnapshot> {
        self.store.snapshot(self.view_id)
    }

    /// Events concerning this view.
    #[must_use]
    pub fn subscribe(&self) -> ViewEvents {
        ViewEvents {
            view_id: self.view_id,
            stream: self.store.events().subscribe(None),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.store.now()
    }

    fn card(&self, record: &DropRecord) -> DropCard {
        DropCard::project(record, self.now(), self.store.is_downloading(record.id()))
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        self.store.unmount(self.view_id);
    }
}

/// Event stream filtered to one view's audience.
pub struct ViewEvents {
    view_id: ViewId,
    stream: EventStream,
}

impl ViewEvents {
    /// Next event concerning the view, or `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        loop {
            let envelope = self.stream.next().await?;
            if concerns_view(&envelope.event, self.view_id) {
                return Some(envelope);
            }
        }
    }

    /// Next already-delivered event concerning the view, without waiting.
    pub fn try_next(&mut self) -> Option<EventEnvelope> {
        while let Some(envelope) = self.stream.try_next() {
            if concerns_view(&envelope.event, self.view_id) {
                return Some(envelope);
            }
        }
        None
    }
}

/// One drop as a view renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropCard {
    /// Drop identifier.
    pub id: DropId,
    /// Title.
    pub title: String,
    /// Description, if any.
    pub description: Option<String>,
    /// Content-type glyph.
    pub icon: &'static str,
    /// Content-type label.
    pub label: &'static str,
    /// Entitlement badge.
    pub entitlement: &'static str,
    /// Scheduled release instant.
    pub release_time: DateTime<Utc>,
    /// Release classification at projection time.
    pub release: Release,
    /// Bookmark state.
    pub bookmarked: bool,
    /// A download may be requested.
    pub can_download: bool,
    /// An external link may be opened.
    pub can_open: bool,
    /// External link target.
    pub link: Option<String>,
    /// A download is in progress.
    pub downloading: bool,
}

impl DropCard {
    /// Project a record at `now`.
    #[must_use]
    pub fn project(record: &DropRecord, now: DateTime<Utc>, downloading: bool) -> Self {
        let profile = record.content_type().profile();
        let release = record.release_at(now);
        let released = release == Release::Released;
        let actions = record.available_actions();
        Self {
            id: record.id().clone(),
            title: record.title().to_string(),
            description: record.description().map(str::to_string),
            icon: profile.icon,
            label: profile.label,
            entitlement: record.entitlement().label(),
            release_time: record.release_time(),
            release,
            bookmarked: record.is_bookmarked(),
            can_download: released && actions.download,
            can_open: actions.external_open,
            link: record.external_link().map(ToString::to_string),
            downloading,
        }
    }
}

/// Dashboard rendering model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardProjection {
    /// Released drops.
    pub released: Vec<DropCard>,
    /// First bookmarks, in bookmark-set order.
    pub bookmark_preview: Vec<DropCard>,
    /// Size of the whole bookmark set.
    pub bookmark_count: usize,
    /// Upcoming drops.
    pub upcoming: Vec<DropCard>,
    /// Data freshness.
    pub freshness: Freshness,
}

/// Bookmarks-page rendering model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarksProjection {
    /// Every bookmarked drop.
    pub bookmarks: Vec<DropCard>,
    /// Data freshness.
    pub freshness: Freshness,
}

/// Detail-page rendering model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetailProjection {
    /// The drop, once loaded.
    pub card: Option<DropCard>,
    /// Data freshness.
    pub freshness: Freshness,
}

fn cards<'a>(handle: &ViewHandle, records: impl Iterator<Item = &'a DropRecord>) -> Vec<DropCard> {
    records.map(|record| handle.card(record)).collect()
}

/// Mounted dashboard.
#[derive(Debug)]
pub struct DashboardView {
    handle: ViewHandle,
}

impl DashboardView {
    pub(crate) fn mount(store: &CatalogStore) -> Self {
        Self {
            handle: ViewHandle::mount(store, ViewKind::Dashboard),
        }
    }

    /// Underlying handle.
    #[must_use]
    pub const fn handle(&self) -> &ViewHandle {
        &self.handle
    }

    /// Render model at the current time. Empty once the view is gone.
    #[must_use]
    pub fn project(&self) -> DashboardProjection {
        let Some(snapshot) = self.handle.snapshot() else {
            return DashboardProjection {
                released: Vec::new(),
                bookmark_preview: Vec::new(),
                bookmark_count: 0,
                upcoming: Vec::new(),
                freshness: Freshness::Empty,
            };
        };
        DashboardProjection {
            released: cards(&self.handle, snapshot.released.iter()),
            bookmark_preview: cards(
                &self.handle,
                snapshot.bookmarks.iter().take(BOOKMARK_PREVIEW_LEN),
            ),
            bookmark_count: snapshot.bookmarks.len(),
            upcoming: cards(&self.handle, snapshot.upcoming.iter()),
            freshness: snapshot.freshness,
        }
    }
}

/// Mounted bookmarks page.
#[derive(Debug)]
pub struct BookmarksView {
    handle: ViewHandle,
}

impl BookmarksView {
    pub(crate) fn mount(store: &CatalogStore) -> Self {
        Self {
            handle: ViewHandle::mount(store, ViewKind::Bookmarks),
        }
    }

    /// Underlying handle.
    #[must_use]
    pub const fn handle(&self) -> &ViewHandle {
        &self.handle
    }

    /// Render model at the current time.
    #[must_use]
    pub fn project(&self) -> BookmarksProjection {
        self.handle.snapshot().map_or(
            BookmarksProjection {
                bookmarks: Vec::new(),
                freshness: Freshness::Empty,
            },
            |snapshot| BookmarksProjection {
                bookmarks: cards(&self.handle, snapshot.bookmarks.iter()),
                freshness: snapshot.freshness,
            },
        )
    }
}

/// Mounted detail page for one drop.
#[derive(Debug)]
pub struct DetailView {
    handle: ViewHandle,
    drop_id: DropId,
}

impl DetailView {
    pub(crate) fn mount(store: &CatalogStore, drop_id: DropId) -> Self {
        Self {
            handle: ViewHandle::mount(store, ViewKind::Detail(drop_id.clone())),
            drop_id,
        }
    }

    /// Underlying handle.
    #[must_use]
    pub const fn handle(&self) -> &ViewHandle {
        &self.handle
    }

    /// Drop the page shows.
    #[must_use]
    pub const fn drop_id(&self) -> &DropId {
        &self.drop_id
    }

    /// Loaded record, if any.
    #[must_use]
    pub fn record(&self) -> Option<DropRecord> {
        self.handle.snapshot().and_then(|snapshot| snapshot.detail)
    }

    /// Render model at the current time.
    #[must_use]
    pub fn project(&self) -> DetailProjection {
        self.handle.snapshot().map_or(
            DetailProjection {
                card: None,
                freshness: Freshness::Empty,
            },
            |snapshot| DetailProjection {
                card: snapshot.detail.as_ref().map(|record| self.handle.card(record)),
                freshness: snapshot.freshness,
            },
        )
    }
}
