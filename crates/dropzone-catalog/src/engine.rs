//! Session-wide catalog facade wiring the fetcher, synchroniser, and gate.

use std::sync::Arc;

use dropzone_core::{
    CatalogResult, Clock, DropId, DropRecord, DropService, ExternalNavigation, FileSink,
    LinkOpener, SavedFile, SystemClock,
};
use dropzone_events::EventBus;

use crate::access::AccessGate;
use crate::bookmarks::{BookmarkOutcome, BookmarkSynchronizer};
use crate::fetcher::CatalogFetcher;
use crate::store::{CatalogStore, FetchOutcome};
use crate::views::{BookmarksView, DashboardView, DetailView};

/// One authenticated session's catalog.
#[derive(Clone)]
pub struct Catalog {
    store: CatalogStore,
    fetcher: CatalogFetcher,
    bookmarks: BookmarkSynchronizer,
    gate: AccessGate,
}

impl Catalog {
    /// Start building a catalog around a remote service.
    #[must_use]
    pub fn builder(service: Arc<dyn DropService>) -> CatalogBuilder {
        CatalogBuilder {
            service,
            events: None,
            clock: None,
        }
    }

    /// Shared store behind every view.
    #[must_use]
    pub const fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// Event bus views subscribe to.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        self.store.events()
    }

    /// Mount a dashboard view.
    #[must_use]
    pub fn mount_dashboard(&self) -> DashboardView {
        DashboardView::mount(&self.store)
    }

    /// Mount a bookmarks view.
    #[must_use]
    pub fn mount_bookmarks(&self) -> BookmarksView {
        BookmarksView::mount(&self.store)
    }

    /// Mount a detail view for one drop.
    #[must_use]
    pub fn mount_detail(&self, drop_id: DropId) -> DetailView {
        DetailView::mount(&self.store, drop_id)
    }

    /// Fetch released, upcoming, and bookmarked drops for a dashboard.
    ///
    /// # Errors
    ///
    /// See [`CatalogFetcher::fetch_catalog`].
    pub async fn fetch_catalog(&self, view: &DashboardView) -> CatalogResult<FetchOutcome> {
        self.fetcher.fetch_catalog(view.handle().id()).await
    }

    /// Refresh the bookmark set for a bookmarks view.
    ///
    /// # Errors
    ///
    /// See [`CatalogFetcher::fetch_bookmarks`].
    pub async fn fetch_bookmarks(&self, view: &BookmarksView) -> CatalogResult<FetchOutcome> {
        self.fetcher.fetch_bookmarks(view.handle().id()).await
    }

    /// Load the drop a detail view shows.
    ///
    /// # Errors
    ///
    /// See [`CatalogFetcher::fetch_detail`].
    pub async fn fetch_detail(&self, view: &DetailView) -> CatalogResult<FetchOutcome> {
        self.fetcher.fetch_detail(view.handle().id()).await
    }

    /// Toggle a drop's bookmark optimistically.
    ///
    /// # Errors
    ///
    /// See [`BookmarkSynchronizer::toggle_bookmark`].
    pub async fn toggle_bookmark(&self, drop_id: &DropId) -> CatalogResult<BookmarkOutcome> {
        self.bookmarks.toggle_bookmark(drop_id).await
    }

    /// Download a drop's file through the sink.
    ///
    /// # Errors
    ///
    /// See [`AccessGate::request_download`].
    pub async fn request_download(&self, record: &DropRecord) -> CatalogResult<SavedFile> {
        self.gate.request_download(record).await
    }

    /// Open a repository drop's link.
    ///
    /// # Errors
    ///
    /// See [`AccessGate::request_external_open`].
    pub async fn request_external_open(
        &self,
        record: &DropRecord,
    ) -> CatalogResult<ExternalNavigation> {
        self.gate.request_external_open(record).await
    }
}

/// Builder for [`Catalog`].
pub struct CatalogBuilder {
    service: Arc<dyn DropService>,
    events: Option<EventBus>,
    clock: Option<Arc<dyn Clock>>,
}

impl CatalogBuilder {
    /// Publish on an existing bus.
    #[must_use]
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Read observation time from `clock`.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Finish with the local side-effect seams.
    #[must_use]
    pub fn build(self, sink: Arc<dyn FileSink>, opener: Arc<dyn LinkOpener>) -> Catalog {
        let store = CatalogStore::with_clock(
            self.events.unwrap_or_default(),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        );
        Catalog {
            fetcher: CatalogFetcher::new(Arc::clone(&self.service), store.clone()),
            bookmarks: BookmarkSynchronizer::new(Arc::clone(&self.service), store.clone()),
            gate: AccessGate::new(self.service, store.clone(), sink, opener),
            store,
        }
    }
}
