//! Catalog fetches: the dashboard barrier plus bookmark and detail refreshes.

use std::sync::Arc;

use dropzone_core::{
    CatalogError, CatalogResult, Collection, DropRecord, DropService, ServiceError, ServiceResult,
};
use dropzone_events::ViewId;

use crate::store::{CatalogStore, FetchOutcome, FetchTicket, ViewKind};

/// Issues remote fetches on behalf of mounted views.
#[derive(Clone)]
pub struct CatalogFetcher {
    service: Arc<dyn DropService>,
    store: CatalogStore,
}

impl CatalogFetcher {
    /// Fetcher writing into `store`.
    #[must_use]
    pub fn new(service: Arc<dyn DropService>, store: CatalogStore) -> Self {
        Self { service, store }
    }

    /// Load released, upcoming, and bookmarked drops for a view.
    ///
    /// The three calls run concurrently and nothing is written until all of
    /// them have settled. Any failure leaves the view's previous snapshots in
    /// place, marked stale. The calls run on a spawned task so they complete
    /// even if the caller stops waiting; the result is then discarded.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CatalogFetch`] naming the first failing
    /// collection (released, then upcoming, then bookmarked).
    pub async fn fetch_catalog(&self, view_id: ViewId) -> CatalogResult<FetchOutcome> {
        let Some(ticket) = self.store.begin_fetch(view_id) else {
            return Ok(FetchOutcome::Discarded);
        };
        let service = Arc::clone(&self.service);
        let store = self.store.clone();

        let task = tokio::spawn(async move {
            let (released, upcoming, bookmarked) = tokio::join!(
                service.released_drops(),
                service.upcoming_drops(),
                service.bookmarked_drops(),
            );
            let (collection, source) = match (released, upcoming, bookmarked) {
                (Ok(released), Ok(upcoming), Ok(bookmarked)) => {
                    tracing::debug!(
                        view_id,
                        released = released.len(),
                        upcoming = upcoming.len(),
                        bookmarked = bookmarked.len(),
                        "catalog fetched"
                    );
                    return Ok(store.apply_catalog(ticket, released, upcoming, bookmarked));
                }
                (Err(source), _, _) => (Collection::Released, source),
                (_, Err(source), _) => (Collection::Upcoming, source),
                (_, _, Err(source)) => (Collection::Bookmarked, source),
            };
            Err(stale(&store, ticket, collection, source))
        });

        task.await.map_err(|_| CatalogError::TaskAborted {
            operation: "fetch_catalog",
        })?
    }

    /// Refresh only the shared bookmark set on behalf of a view.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::CatalogFetch`] when the call fails.
    pub async fn fetch_bookmarks(&self, view_id: ViewId) -> CatalogResult<FetchOutcome> {
        let Some(ticket) = self.store.begin_fetch(view_id) else {
            return Ok(FetchOutcome::Discarded);
        };
        let service = Arc::clone(&self.service);
        let store = self.store.clone();

        let task = tokio::spawn(async move {
            match service.bookmarked_drops().await {
                Ok(bookmarked) => Ok(store.apply_bookmarks(ticket, bookmarked)),
                Err(source) => Err(stale(&store, ticket, Collection::Bookmarked, source)),
            }
        });

        task.await.map_err(|_| CatalogError::TaskAborted {
            operation: "fetch_bookmarks",
        })?
    }

    /// Load the drop a detail view shows.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] when the drop no longer exists and
    /// [`CatalogError::CatalogFetch`] for any other failure.
    pub async fn fetch_detail(&self, view_id: ViewId) -> CatalogResult<FetchOutcome> {
        let Some(ViewKind::Detail(drop_id)) = self.store.view_kind(view_id) else {
            return Ok(FetchOutcome::Discarded);
        };
        let Some(ticket) = self.store.begin_fetch(view_id) else {
            return Ok(FetchOutcome::Discarded);
        };
        let service = Arc::clone(&self.service);
        let store = self.store.clone();

        let task = tokio::spawn(async move {
            let result: ServiceResult<DropRecord> = service.drop_by_id(&drop_id).await;
            match result {
                Ok(record) => Ok(store.apply_detail(ticket, record)),
                Err(ServiceError::NotFound { .. }) => {
                    mark_stale(&store, ticket, Collection::Detail);
                    Err(CatalogError::NotFound { drop_id })
                }
                Err(source) => Err(stale(&store, ticket, Collection::Detail, source)),
            }
        });

        task.await.map_err(|_| CatalogError::TaskAborted {
            operation: "fetch_detail",
        })?
    }
}

fn stale(
    store: &CatalogStore,
    ticket: FetchTicket,
    collection: Collection,
    source: ServiceError,
) -> CatalogError {
    tracing::warn!(
        view_id = ticket.view_id(),
        collection = %collection,
        error = %source,
        "catalog fetch failed; keeping previous snapshot"
    );
    mark_stale(store, ticket, collection);
    CatalogError::CatalogFetch { collection, source }
}

fn mark_stale(store: &CatalogStore, ticket: FetchTicket, collection: Collection) {
    if store.mark_stale(ticket, collection) == FetchOutcome::Discarded {
        tracing::debug!(
            view_id = ticket.view_id(),
            collection = %collection,
            "stale marking skipped; a newer fetch owns the view"
        );
    }
}
