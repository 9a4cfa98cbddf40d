#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! `reqwest`-backed [`DropService`](dropzone_core::DropService) for the DropZone REST API.
//!
//! Layout: `http.rs` (service + options), `problem.rs` (status → error
//! classification), `disposition.rs` (`Content-Disposition` parsing).

pub mod disposition;
pub mod http;
pub mod problem;

pub use disposition::attachment_filename;
pub use http::{ClientBuildError, ClientOptions, HttpDropService};
pub use problem::classify_problem;
