//! Mounted views, their snapshots, and the shared bookmark set.
//!
//! # Design
//! - One mutex guards every snapshot so a toggle updates all copies of a drop
//!   in a single critical section; events are published after the lock is
//!   released.
//! - Each view carries a fetch generation. A fetch captures the generation
//!   when it starts; results whose generation is no longer current, or whose
//!   view was unmounted, are discarded.
//! - Toggles register an in-flight entry keyed by drop id. The entry carries
//!   everything needed to restore the prior state, including the drop's
//!   former position in the bookmark set.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use dropzone_core::{
    CatalogError, CatalogResult, Clock, Collection, DropId, DropRecord, SystemClock, ToggleAck,
};
use dropzone_events::{BookmarkPhase, Event, EventBus, ViewId};
use serde::Serialize;

use crate::snapshot::CatalogSnapshot;

/// What a mounted view displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewKind {
    /// Released and upcoming drops plus a bookmark preview.
    Dashboard,
    /// The user's bookmark list.
    Bookmarks,
    /// One drop.
    Detail(DropId),
}

impl ViewKind {
    const fn shows_bookmark_set(&self) -> bool {
        matches!(self, Self::Dashboard | Self::Bookmarks)
    }
}

/// Whether a view's data reflects its last fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Freshness {
    /// Nothing fetched yet.
    Empty,
    /// Last fetch succeeded.
    Fresh {
        /// When the fetch settled.
        fetched_at: DateTime<Utc>,
    },
    /// Last fetch failed; prior data, if any, is still shown.
    Stale {
        /// When data was last fetched successfully.
        fetched_at: Option<DateTime<Utc>>,
        /// Collection whose call failed.
        collection: Collection,
    },
}

impl Freshness {
    const fn fetched_at(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Empty => None,
            Self::Fresh { fetched_at } => Some(fetched_at),
            Self::Stale { fetched_at, .. } => fetched_at,
        }
    }
}

/// Read-only copy of everything a view renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    /// View identifier.
    pub view_id: ViewId,
    /// View kind.
    pub kind: ViewKind,
    /// Released drops fetched for this view.
    pub released: CatalogSnapshot,
    /// Upcoming drops fetched for this view.
    pub upcoming: CatalogSnapshot,
    /// Shared bookmark set.
    pub bookmarks: CatalogSnapshot,
    /// Record shown by a detail view.
    pub detail: Option<DropRecord>,
    /// Freshness of the view's data.
    pub freshness: Freshness,
}

/// Capture of a view's fetch generation taken when a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    view_id: ViewId,
    generation: u64,
}

impl FetchTicket {
    /// View the fetch belongs to.
    #[must_use]
    pub const fn view_id(self) -> ViewId {
        self.view_id
    }
}

/// Whether a settled fetch reached its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// Snapshots were replaced.
    Applied,
    /// The view was torn down or a newer fetch superseded this one.
    Discarded,
}

#[derive(Debug)]
struct MountedView {
    kind: ViewKind,
    released: CatalogSnapshot,
    upcoming: CatalogSnapshot,
    detail: Option<Arc<DropRecord>>,
    freshness: Freshness,
    generation: u64,
}

impl MountedView {
    fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            released: CatalogSnapshot::default(),
            upcoming: CatalogSnapshot::default(),
            detail: None,
            freshness: Freshness::Empty,
            generation: 0,
        }
    }

    fn holds(&self, id: &DropId) -> bool {
        self.released.contains(id)
            || self
                .detail
                .as_ref()
                .is_some_and(|record| record.id() == id)
    }
}

#[derive(Debug)]
struct PendingToggle {
    target: bool,
    prior_record: DropRecord,
    bookmark_slot: Option<usize>,
}

#[derive(Debug, Default)]
struct CatalogState {
    next_view_id: ViewId,
    views: BTreeMap<ViewId, MountedView>,
    bookmarks: CatalogSnapshot,
    pending: HashMap<DropId, PendingToggle>,
    downloads: HashMap<DropId, usize>,
}

impl CatalogState {
    fn current(&self, ticket: FetchTicket) -> bool {
        self.views
            .get(&ticket.view_id)
            .is_some_and(|view| view.generation == ticket.generation)
    }

    fn find_record(&self, id: &DropId) -> Option<(DropRecord, bool)> {
        if let Some(record) = self.bookmarks.get(id) {
            return Some((record.clone(), true));
        }
        self.views.values().find_map(|view| {
            view.released
                .get(id)
                .cloned()
                .or_else(|| {
                    view.detail
                        .as_deref()
                        .filter(|record| record.id() == id)
                        .cloned()
                })
                .map(|record| (record, false))
        })
    }

    fn only_upcoming(&self, id: &DropId) -> bool {
        self.views.values().any(|view| view.upcoming.contains(id))
    }

    /// Write one bookmark state onto every copy of a drop. Returns the touched views.
    fn apply_bookmark_state(
        &mut self,
        id: &DropId,
        bookmarked: bool,
        source: &DropRecord,
        slot: Option<usize>,
    ) -> Vec<ViewId> {
        let set_changed = if bookmarked {
            if self.bookmarks.contains(id) {
                self.bookmarks.set_bookmark(id, true);
                false
            } else {
                let index = slot.unwrap_or(self.bookmarks.len());
                self.bookmarks.insert_at(index, source.with_bookmark(true))
            }
        } else {
            self.bookmarks.remove(id).is_some()
        };

        let mut touched = Vec::new();
        for (view_id, view) in &mut self.views {
            let mut hit = view.released.set_bookmark(id, bookmarked);
            if let Some(detail) = view.detail.as_mut().filter(|record| record.id() == id) {
                if detail.is_bookmarked() != bookmarked {
                    *detail = Arc::new(detail.with_bookmark(bookmarked));
                }
                hit = true;
            }
            if hit || (set_changed && view.kind.shows_bookmark_set()) {
                touched.push(*view_id);
            }
        }
        touched
    }

    /// Fold in-flight toggle targets over freshly fetched data.
    fn overlay_pending(&mut self) {
        let pending: Vec<(DropId, bool, DropRecord)> = self
            .pending
            .iter()
            .map(|(id, entry)| (id.clone(), entry.target, entry.prior_record.clone()))
            .collect();
        for (id, target, prior_record) in pending {
            let source = self.find_record(&id).map_or(prior_record, |(record, _)| record);
            self.apply_bookmark_state(&id, target, &source, None);
        }
    }

    /// Make every released and detail copy agree with bookmark-set membership.
    fn sync_flags_with_bookmarks(&mut self) {
        let bookmarks = &self.bookmarks;
        for view in self.views.values_mut() {
            let ids: Vec<DropId> = view.released.ids().to_vec();
            for id in ids {
                view.released.set_bookmark(&id, bookmarks.contains(&id));
            }
            if let Some(detail) = view.detail.as_mut() {
                let member = bookmarks.contains(detail.id());
                if detail.is_bookmarked() != member {
                    *detail = Arc::new(detail.with_bookmark(member));
                }
            }
        }
    }
}

/// Shared catalog state behind every view of one session.
#[derive(Clone)]
pub struct CatalogStore {
    state: Arc<Mutex<CatalogState>>,
    events: EventBus,
    clock: Arc<dyn Clock>,
}

impl CatalogStore {
    /// Store publishing on `events` and reading time from the system clock.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self::with_clock(events, Arc::new(SystemClock))
    }

    /// Store with an explicit clock.
    #[must_use]
    pub fn with_clock(events: EventBus, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CatalogState {
                next_view_id: 1,
                ..CatalogState::default()
            })),
            events,
            clock,
        }
    }

    /// Event bus views subscribe to.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// Current observation time.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Register a view and return its id.
    pub fn mount(&self, kind: ViewKind) -> ViewId {
        let mut state = self.lock();
        let view_id = state.next_view_id;
        state.next_view_id = view_id.saturating_add(1);
        tracing::debug!(view_id, kind = ?kind, "view mounted");
        state.views.insert(view_id, MountedView::new(kind));
        view_id
    }

    /// Tear a view down. Results of fetches it issued are discarded from now on.
    pub fn unmount(&self, view_id: ViewId) {
        if self.lock().views.remove(&view_id).is_some() {
            tracing::debug!(view_id, "view unmounted");
        }
    }

    /// Whether a view is still mounted.
    #[must_use]
    pub fn is_mounted(&self, view_id: ViewId) -> bool {
        self.lock().views.contains_key(&view_id)
    }

    /// Kind of a mounted view.
    #[must_use]
    pub fn view_kind(&self, view_id: ViewId) -> Option<ViewKind> {
        self.lock().views.get(&view_id).map(|view| view.kind.clone())
    }

    /// Copy of a view's current data.
    #[must_use]
    pub fn snapshot(&self, view_id: ViewId) -> Option<ViewSnapshot> {
        let state = self.lock();
        let view = state.views.get(&view_id)?;
        Some(ViewSnapshot {
            view_id,
            kind: view.kind.clone(),
            released: view.released.clone(),
            upcoming: view.upcoming.clone(),
            bookmarks: state.bookmarks.clone(),
            detail: view.detail.as_deref().cloned(),
            freshness: view.freshness,
        })
    }

    /// Shared bookmark set.
    #[must_use]
    pub fn bookmarks(&self) -> CatalogSnapshot {
        self.lock().bookmarks.clone()
    }

    /// Whether a toggle for `id` is awaiting the service.
    #[must_use]
    pub fn toggle_in_flight(&self, id: &DropId) -> bool {
        self.lock().pending.contains_key(id)
    }

    /// Whether a download of `id` is in progress.
    #[must_use]
    pub fn is_downloading(&self, id: &DropId) -> bool {
        self.lock().downloads.get(id).is_some_and(|count| *count > 0)
    }

    /// Start a fetch for a view, superseding any fetch it already has in flight.
    #[must_use]
    pub fn begin_fetch(&self, view_id: ViewId) -> Option<FetchTicket> {
        let mut state = self.lock();
        let view = state.views.get_mut(&view_id)?;
        view.generation = view.generation.wrapping_add(1);
        Some(FetchTicket {
            view_id,
            generation: view.generation,
        })
    }

    /// Replace a dashboard's snapshots with the results of a complete fetch.
    pub fn apply_catalog(
        &self,
        ticket: FetchTicket,
        released: Vec<DropRecord>,
        upcoming: Vec<DropRecord>,
        bookmarked: Vec<DropRecord>,
    ) -> FetchOutcome {
        let now = self.now();
        let mut state = self.lock();
        if !state.current(ticket) {
            drop(state);
            return self.discard(ticket, "fetch_catalog");
        }

        state.bookmarks = CatalogSnapshot::from_records(bookmarked);
        if let Some(view) = state.views.get_mut(&ticket.view_id) {
            view.released = CatalogSnapshot::from_records(released);
            view.upcoming = CatalogSnapshot::from_records(upcoming);
            view.freshness = Freshness::Fresh { fetched_at: now };
        }
        state.sync_flags_with_bookmarks();
        state.overlay_pending();

        let event = state.views.get(&ticket.view_id).map(|view| Event::CatalogLoaded {
            view_id: ticket.view_id,
            released: view.released.len(),
            upcoming: view.upcoming.len(),
            bookmarked: state.bookmarks.len(),
        });
        drop(state);
        if let Some(event) = event {
            self.events.send(event);
        }
        FetchOutcome::Applied
    }

    /// Replace the shared bookmark set with a bookmarks-only fetch.
    pub fn apply_bookmarks(&self, ticket: FetchTicket, bookmarked: Vec<DropRecord>) -> FetchOutcome {
        let now = self.now();
        let mut state = self.lock();
        if !state.current(ticket) {
            drop(state);
            return self.discard(ticket, "fetch_bookmarks");
        }

        state.bookmarks = CatalogSnapshot::from_records(bookmarked);
        if let Some(view) = state.views.get_mut(&ticket.view_id) {
            view.freshness = Freshness::Fresh { fetched_at: now };
        }
        state.sync_flags_with_bookmarks();
        state.overlay_pending();
        let count = state.bookmarks.len();
        drop(state);

        self.events.send(Event::BookmarksLoaded {
            view_id: ticket.view_id,
            bookmarked: count,
        });
        FetchOutcome::Applied
    }

    /// Replace a detail view's record.
    ///
    /// The fetched bookmark flag is authoritative for the drop and is written to
    /// every other copy, unless a toggle for it is still in flight.
    pub fn apply_detail(&self, ticket: FetchTicket, record: DropRecord) -> FetchOutcome {
        let now = self.now();
        let mut state = self.lock();
        if !state.current(ticket) {
            drop(state);
            return self.discard(ticket, "fetch_detail");
        }

        let id = record.id().clone();
        let bookmarked = state
            .pending
            .get(&id)
            .map_or(record.is_bookmarked(), |pending| pending.target);
        let record = record.with_bookmark(bookmarked);
        if let Some(view) = state.views.get_mut(&ticket.view_id) {
            view.detail = Some(Arc::new(record.clone()));
            view.freshness = Freshness::Fresh { fetched_at: now };
        }
        let slot = state.bookmarks.position(&id);
        state.apply_bookmark_state(&id, bookmarked, &record, slot);
        drop(state);

        self.events.send(Event::DetailLoaded {
            view_id: ticket.view_id,
            drop_id: id.to_string(),
        });
        FetchOutcome::Applied
    }

    /// Keep a view's data but mark it stale after a failed fetch.
    pub fn mark_stale(&self, ticket: FetchTicket, collection: Collection) -> FetchOutcome {
        let mut state = self.lock();
        if !state.current(ticket) {
            drop(state);
            return self.discard(ticket, "mark_stale");
        }
        if let Some(view) = state.views.get_mut(&ticket.view_id) {
            view.freshness = Freshness::Stale {
                fetched_at: view.freshness.fetched_at(),
                collection,
            };
        }
        drop(state);

        self.events.send(Event::CatalogStale {
            view_id: ticket.view_id,
            collection: collection.to_string(),
        });
        FetchOutcome::Applied
    }

    /// Apply the optimistic half of a bookmark toggle.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ToggleInFlight`] when the drop already has a toggle
    /// awaiting the service, and [`CatalogError::ContractViolation`] when the
    /// drop is unknown to every mounted view or not released yet.
    pub fn begin_toggle(&self, id: &DropId) -> CatalogResult<ToggleTicket> {
        let now = self.now();
        let mut state = self.lock();
        if state.pending.contains_key(id) {
            return Err(CatalogError::ToggleInFlight {
                drop_id: id.clone(),
            });
        }
        let Some((record, member)) = state.find_record(id) else {
            let reason = if state.only_upcoming(id) {
                "drop is not released yet"
            } else {
                "drop is not loaded in any view"
            };
            return Err(CatalogError::ContractViolation {
                operation: "toggle_bookmark",
                drop_id: id.clone(),
                reason,
            });
        };
        if !record.is_released_at(now) {
            return Err(CatalogError::ContractViolation {
                operation: "toggle_bookmark",
                drop_id: id.clone(),
                reason: "drop is not released yet",
            });
        }

        let prior = member || record.is_bookmarked();
        let target = !prior;
        let bookmark_slot = state.bookmarks.position(id);
        let views = state.apply_bookmark_state(id, target, &record, None);
        state.pending.insert(
            id.clone(),
            PendingToggle {
                target,
                prior_record: record.with_bookmark(prior),
                bookmark_slot,
            },
        );
        drop(state);

        tracing::debug!(drop_id = %id, bookmarked = target, "bookmark toggled optimistically");
        self.events.send(Event::BookmarkChanged {
            drop_id: id.to_string(),
            bookmarked: target,
            phase: BookmarkPhase::Optimistic,
            views,
        });
        Ok(ToggleTicket {
            store: self.clone(),
            drop_id: id.clone(),
            prior,
            target,
            settled: false,
        })
    }

    fn commit_toggle(&self, id: &DropId, target: bool, ack: ToggleAck) {
        let views = {
            let mut state = self.lock();
            state.pending.remove(id);
            state
                .views
                .iter()
                .filter(|(_, view)| view.holds(id) || view.kind.shows_bookmark_set())
                .map(|(view_id, _)| *view_id)
                .collect()
        };
        if let Some(reported) = ack.bookmarked.filter(|reported| *reported != target) {
            tracing::warn!(
                drop_id = %id,
                expected = target,
                reported,
                "service reported a different bookmark state; keeping local state"
            );
        }
        self.events.send(Event::BookmarkChanged {
            drop_id: id.to_string(),
            bookmarked: target,
            phase: BookmarkPhase::Confirmed,
            views,
        });
    }

    fn revert_toggle(&self, id: &DropId) {
        let mut state = self.lock();
        let Some(pending) = state.pending.remove(id) else {
            return;
        };
        let prior = pending.prior_record.is_bookmarked();
        let views =
            state.apply_bookmark_state(id, prior, &pending.prior_record, pending.bookmark_slot);
        drop(state);

        self.events.send(Event::BookmarkChanged {
            drop_id: id.to_string(),
            bookmarked: prior,
            phase: BookmarkPhase::Reverted,
            views,
        });
    }

    /// Mark a download of `id` in progress until the guard drops.
    #[must_use]
    pub fn begin_download(&self, id: &DropId) -> DownloadGuard {
        *self.lock().downloads.entry(id.clone()).or_default() += 1;
        DownloadGuard {
            store: self.clone(),
            drop_id: id.clone(),
        }
    }

    fn finish_download(&self, id: &DropId) {
        let mut state = self.lock();
        if let Some(count) = state.downloads.get_mut(id) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                state.downloads.remove(id);
            }
        }
    }

    fn discard(&self, ticket: FetchTicket, operation: &str) -> FetchOutcome {
        tracing::debug!(view_id = ticket.view_id, operation, "discarding result for stale view");
        self.events.send(Event::UpdateDiscarded {
            view_id: ticket.view_id,
            operation: operation.to_string(),
        });
        FetchOutcome::Discarded
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-flight bookmark toggle.
///
/// Settle it with [`ToggleTicket::commit`] or [`ToggleTicket::revert`]. A
/// ticket dropped unsettled reverts, so a panicking remote call cannot leave
/// the optimistic state or the in-flight entry behind.
#[derive(Debug)]
#[must_use = "an unsettled toggle reverts when dropped"]
pub struct ToggleTicket {
    store: CatalogStore,
    drop_id: DropId,
    prior: bool,
    target: bool,
    settled: bool,
}

impl ToggleTicket {
    /// Drop being toggled.
    #[must_use]
    pub const fn drop_id(&self) -> &DropId {
        &self.drop_id
    }

    /// State before the toggle.
    #[must_use]
    pub const fn prior(&self) -> bool {
        self.prior
    }

    /// State the toggle moves to.
    #[must_use]
    pub const fn target(&self) -> bool {
        self.target
    }

    /// Keep the optimistic state after the service acknowledged it.
    pub fn commit(mut self, ack: ToggleAck) -> bool {
        self.settled = true;
        self.store.commit_toggle(&self.drop_id, self.target, ack);
        self.target
    }

    /// Restore the prior state on every copy that exists now.
    pub fn revert(mut self) -> bool {
        self.settled = true;
        self.store.revert_toggle(&self.drop_id);
        self.prior
    }
}

impl Drop for ToggleTicket {
    fn drop(&mut self) {
        if !self.settled {
            tracing::warn!(drop_id = %self.drop_id, "bookmark toggle abandoned; reverting");
            self.store.revert_toggle(&self.drop_id);
        }
    }
}

/// Marks a drop as downloading while alive.
#[derive(Debug)]
#[must_use = "the download indicator clears when the guard drops"]
pub struct DownloadGuard {
    store: CatalogStore,
    drop_id: DropId,
}

impl Drop for DownloadGuard {
    fn drop(&mut self) {
        self.store.finish_download(&self.drop_id);
    }
}

impl std::fmt::Debug for CatalogStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.debug_struct("CatalogStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropzone_test_support::fixtures::{DropFixture, FixedClock};

    fn store() -> CatalogStore {
        CatalogStore::with_clock(EventBus::new(), Arc::new(FixedClock::at_fixture_now()))
    }

    fn load_dashboard(store: &CatalogStore, bookmarked: &[&str]) -> ViewId {
        let view = store.mount(ViewKind::Dashboard);
        let ticket = store.begin_fetch(view).expect("view mounted");
        let released = ["a", "b", "c"]
            .iter()
            .map(|id| DropFixture::released(id).build())
            .collect();
        let bookmarks = bookmarked
            .iter()
            .map(|id| DropFixture::released(id).bookmarked(true).build())
            .collect();
        let upcoming = vec![DropFixture::upcoming("u").build()];
        assert_eq!(
            store.apply_catalog(ticket, released, upcoming, bookmarks),
            FetchOutcome::Applied
        );
        view
    }

    fn bookmark_ids(store: &CatalogStore) -> Vec<String> {
        store
            .bookmarks()
            .ids()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn fetch_reconciles_released_copies_with_bookmark_set() {
        let store = store();
        let view = load_dashboard(&store, &["b"]);
        let snapshot = store.snapshot(view).expect("mounted");
        assert!(
            snapshot
                .released
                .get(&DropId::from("b"))
                .is_some_and(DropRecord::is_bookmarked)
        );
        assert!(
            !snapshot
                .released
                .get(&DropId::from("a"))
                .is_some_and(DropRecord::is_bookmarked)
        );
    }

    #[test]
    fn revert_restores_bookmark_position() {
        let store = store();
        let view = load_dashboard(&store, &["a", "b", "c"]);
        let before = store.snapshot(view).expect("mounted");

        let ticket = store.begin_toggle(&DropId::from("b")).expect("toggle accepted");
        assert!(!ticket.target());
        assert_eq!(bookmark_ids(&store), ["a", "c"]);
        assert!(ticket.revert());

        assert_eq!(store.snapshot(view).expect("mounted"), before);
        assert!(!store.toggle_in_flight(&DropId::from("b")));
    }

    #[test]
    fn second_toggle_is_rejected_while_first_is_pending() {
        let store = store();
        let _view = load_dashboard(&store, &[]);
        let ticket = store.begin_toggle(&DropId::from("a")).expect("first accepted");
        let second = store.begin_toggle(&DropId::from("a"));
        assert!(matches!(second, Err(CatalogError::ToggleInFlight { .. })));
        assert!(ticket.commit(ToggleAck::default()));
        assert!(store.begin_toggle(&DropId::from("a")).is_ok());
    }

    #[test]
    fn upcoming_and_unknown_drops_cannot_be_toggled() {
        let store = store();
        let _view = load_dashboard(&store, &[]);
        let upcoming = store.begin_toggle(&DropId::from("u"));
        assert!(matches!(
            upcoming,
            Err(CatalogError::ContractViolation {
                reason: "drop is not released yet",
                ..
            })
        ));
        let unknown = store.begin_toggle(&DropId::from("zzz"));
        assert!(matches!(
            unknown,
            Err(CatalogError::ContractViolation {
                reason: "drop is not loaded in any view",
                ..
            })
        ));
    }

    #[test]
    fn abandoned_ticket_reverts() {
        let store = store();
        let view = load_dashboard(&store, &[]);
        let before = store.snapshot(view).expect("mounted");
        drop(store.begin_toggle(&DropId::from("c")).expect("accepted"));
        assert_eq!(store.snapshot(view).expect("mounted"), before);
    }

    #[test]
    fn refetch_keeps_pending_toggle_target() {
        let store = store();
        let view = load_dashboard(&store, &[]);
        let ticket = store.begin_toggle(&DropId::from("a")).expect("accepted");

        // Server has not seen the toggle yet, so the refetch reports no bookmarks.
        let view_again = load_dashboard_into(&store, view, &[]);
        assert_eq!(view_again, FetchOutcome::Applied);
        assert_eq!(bookmark_ids(&store), ["a"]);

        ticket.revert();
        assert!(store.bookmarks().is_empty());
        let snapshot = store.snapshot(view).expect("mounted");
        assert!(
            !snapshot
                .released
                .get(&DropId::from("a"))
                .is_some_and(DropRecord::is_bookmarked)
        );
    }

    fn load_dashboard_into(store: &CatalogStore, view: ViewId, bookmarked: &[&str]) -> FetchOutcome {
        let ticket = store.begin_fetch(view).expect("view mounted");
        let released = vec![DropFixture::released("a").build()];
        let bookmarks = bookmarked
            .iter()
            .map(|id| DropFixture::released(id).bookmarked(true).build())
            .collect();
        store.apply_catalog(ticket, released, Vec::new(), bookmarks)
    }

    #[test]
    fn superseded_and_unmounted_fetches_are_discarded() {
        let store = store();
        let view = store.mount(ViewKind::Dashboard);
        let stale = store.begin_fetch(view).expect("mounted");
        let fresh = store.begin_fetch(view).expect("mounted");

        assert_eq!(
            store.apply_catalog(stale, Vec::new(), Vec::new(), Vec::new()),
            FetchOutcome::Discarded
        );
        assert_eq!(store.mark_stale(fresh, Collection::Upcoming), FetchOutcome::Applied);

        store.unmount(view);
        assert_eq!(
            store.apply_catalog(fresh, Vec::new(), Vec::new(), Vec::new()),
            FetchOutcome::Discarded
        );
        assert!(store.snapshot(view).is_none());
    }

    #[test]
    fn download_guard_clears_indicator() {
        let store = store();
        let id = DropId::from("a");
        let first = store.begin_download(&id);
        let second = store.begin_download(&id);
        drop(first);
        assert!(store.is_downloading(&id));
        drop(second);
        assert!(!store.is_downloading(&id));
    }
}
