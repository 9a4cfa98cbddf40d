#![forbid(unsafe_code)]
#![warn(
    unused,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

//! Telemetry primitives shared by DropZone binaries.
//!
//! Layout: `init.rs` (subscriber installation, log format, build SHA) and
//! `context.rs` (command span and task-local request context).

pub mod context;
pub mod init;

pub use context::{command_span, current_command, current_request_id, with_command_context};
pub use init::{DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, build_sha, init_logging};
