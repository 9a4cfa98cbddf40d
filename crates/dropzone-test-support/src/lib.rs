#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Shared test helpers used across DropZone suites.
//! Layout: fixtures.rs (drop builders, fixed clock), mocks.rs (scripted drop service),
//! effects.rs (recording sink and opener).

pub mod effects;
pub mod fixtures;
pub mod mocks;
