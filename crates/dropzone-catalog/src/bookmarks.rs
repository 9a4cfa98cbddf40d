//! Optimistic bookmark toggles.

use std::sync::Arc;

use dropzone_core::{CatalogError, CatalogResult, DropId, DropService};
use serde::Serialize;

use crate::store::CatalogStore;

/// Settled result of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookmarkOutcome {
    /// Drop that was toggled.
    pub drop_id: DropId,
    /// Bookmark state now shown by every view.
    pub bookmarked: bool,
}

/// Flips bookmarks locally first, then confirms or reverts with the service.
#[derive(Clone)]
pub struct BookmarkSynchronizer {
    service: Arc<dyn DropService>,
    store: CatalogStore,
}

impl BookmarkSynchronizer {
    /// Synchroniser writing into `store`.
    #[must_use]
    pub fn new(service: Arc<dyn DropService>, store: CatalogStore) -> Self {
        Self { service, store }
    }

    /// Toggle the bookmark on a released drop.
    ///
    /// Every loaded copy of the drop shows the new state before the remote call
    /// is issued. On failure every copy that exists at settle time is restored
    /// to the prior state. The remote call and the settle step run on a
    /// spawned task, so dropping the returned future does not leave the drop
    /// stuck in flight.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::ToggleInFlight`] when a toggle for the drop is pending.
    /// - [`CatalogError::ContractViolation`] for unknown or unreleased drops.
    /// - [`CatalogError::BookmarkSync`] when the service call failed; local
    ///   state has already been reverted.
    pub async fn toggle_bookmark(&self, drop_id: &DropId) -> CatalogResult<BookmarkOutcome> {
        let ticket = self.store.begin_toggle(drop_id)?;
        let service = Arc::clone(&self.service);
        let drop_id = drop_id.clone();

        let task = tokio::spawn(async move {
            let result = service.toggle_bookmark(&drop_id).await;
            match result {
                Ok(ack) => {
                    let bookmarked = ticket.commit(ack);
                    tracing::info!(drop_id = %drop_id, bookmarked, "bookmark updated");
                    Ok(BookmarkOutcome {
                        drop_id,
                        bookmarked,
                    })
                }
                Err(source) => {
                    let restored = ticket.revert();
                    tracing::warn!(
                        drop_id = %drop_id,
                        restored,
                        error = %source,
                        "bookmark update failed; reverted"
                    );
                    Err(CatalogError::BookmarkSync { drop_id, source })
                }
            }
        });

        task.await.map_err(|_| CatalogError::TaskAborted {
            operation: "toggle_bookmark",
        })?
    }
}
