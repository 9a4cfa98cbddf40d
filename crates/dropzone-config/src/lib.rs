#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Client configuration assembled from defaults, a JSON file, the environment,
//! and command-line overrides, in that order.
//!
//! Layout: `defaults.rs` (built-in values and variable names), `model.rs`
//! (`ClientConfig`, `ConfigPatch`), `loader.rs` (layering), `validate.rs`
//! (field checks), `error.rs`.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use model::{ClientConfig, ConfigPatch};
