#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Engine-agnostic drop model and remote-service interfaces.
//!
//! Layout: `model/` (drop records, content types, release classification),
//! `service/` (remote service, file sink and link opener seams), `error.rs`
//! (service and catalog error taxonomy), `clock.rs`, `identity.rs`.

pub mod clock;
pub mod error;
pub mod identity;
pub mod model;
pub mod service;

pub use clock::{Clock, SystemClock};
pub use error::{CatalogError, CatalogResult, Collection, ServiceError, ServiceResult};
pub use identity::display_name_hint;
pub use model::{
    ContentProfile, ContentType, DropId, DropPayload, DropRecord, Entitlement, PermittedActions,
    Release,
};
pub use service::{
    DownloadPayload, DropService, ExternalNavigation, FileSink, HealthStatus, LinkOpener,
    NavigationIsolation, OpenError, SavedFile, ToggleAck,
};
