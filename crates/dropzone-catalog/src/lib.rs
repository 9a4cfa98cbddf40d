#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Client-side catalog engine for DropZone.
//!
//! A [`Catalog`] owns one session's state: the snapshots each mounted view
//! shows, the bookmark set they share, and the toggles and downloads in
//! flight. Views mount through the catalog, fetch through it, and re-render
//! when the event bus reports a change that concerns them.
//!
//! Layout: `store.rs` (shared state and toggle bookkeeping), `snapshot.rs`
//! (ordered record sets), `fetcher.rs`, `bookmarks.rs`, `access.rs`,
//! `views.rs` (handles and projections), `sink.rs` (filesystem sink),
//! `engine.rs` (facade).

pub mod access;
pub mod bookmarks;
pub mod engine;
pub mod fetcher;
pub mod sink;
pub mod snapshot;
pub mod store;
pub mod views;

pub use access::{AccessGate, download_filename};
pub use bookmarks::{BookmarkOutcome, BookmarkSynchronizer};
pub use engine::{Catalog, CatalogBuilder};
pub use fetcher::CatalogFetcher;
pub use sink::{DirectorySink, sanitize_filename};
pub use snapshot::CatalogSnapshot;
pub use store::{
    CatalogStore, DownloadGuard, FetchOutcome, FetchTicket, Freshness, ToggleTicket, ViewKind,
    ViewSnapshot,
};
pub use views::{
    BOOKMARK_PREVIEW_LEN, BookmarksProjection, BookmarksView, DashboardProjection, DashboardView,
    DetailProjection, DetailView, DropCard, ViewEvents, ViewHandle,
};
