#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Change notifications published by the catalog engine.
//!
//! Views subscribe to the bus and re-render when an event addressed to them (or
//! to the shared bookmark set) arrives. The bus keeps a bounded replay ring so a
//! view that re-subscribes with the last id it saw does not miss a change.
//!
//! Layout: `payloads.rs` (event enum + envelope), `routing.rs` (`EventBus`),
//! `topics.rs` (audience helpers).

pub mod payloads;
pub mod routing;
pub mod topics;

pub use payloads::{
    BookmarkPhase, DEFAULT_REPLAY_CAPACITY, Event, EventEnvelope, EventId, ViewId,
};
pub use routing::{EventBus, EventStream};
pub use topics::{concerns_view, event_kind};
