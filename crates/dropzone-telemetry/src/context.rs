//! Command-scoped tracing context.
//!
//! # Design
//! - The running command and the client's request id live in task-local
//!   storage so deep call sites can read them without plumbing.
//! - A `command` span tags every log line with the command, request id, and
//!   build SHA.

use std::future::Future;
use std::sync::Arc;

use tracing::Span;

use crate::init::build_sha;

/// Span wrapping one CLI command invocation.
#[must_use]
pub fn command_span(command: &str, request_id: &str) -> Span {
    tracing::info_span!(
        "command",
        name = %command,
        request_id = %request_id,
        build_sha = %build_sha()
    )
}

/// Run `fut` with the request id and command name available to downstream code.
pub async fn with_command_context<Fut, T>(
    request_id: impl Into<String>,
    command: impl Into<String>,
    fut: Fut,
) -> T
where
    Fut: Future<Output = T>,
{
    let context = CommandContext {
        request_id: Arc::from(request_id.into()),
        command: Arc::from(command.into()),
    };
    ACTIVE_COMMAND_CONTEXT.scope(context, fut).await
}

/// Request id of the surrounding command, if one is set.
#[must_use]
pub fn current_request_id() -> Option<String> {
    ACTIVE_COMMAND_CONTEXT
        .try_with(|ctx| ctx.request_id.as_ref().to_string())
        .ok()
}

/// Name of the surrounding command, if one is set.
#[must_use]
pub fn current_command() -> Option<String> {
    ACTIVE_COMMAND_CONTEXT
        .try_with(|ctx| ctx.command.as_ref().to_string())
        .ok()
}

#[derive(Clone)]
struct CommandContext {
    request_id: Arc<str>,
    command: Arc<str>,
}

tokio::task_local! {
    static ACTIVE_COMMAND_CONTEXT: CommandContext;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_span_can_be_entered() {
        let span = command_span("dashboard", "req-1");
        let _entered = span.enter();
    }

    #[tokio::test]
    async fn context_is_visible_only_inside_scope() {
        let output = with_command_context("req-42", "download", async {
            assert_eq!(current_request_id().as_deref(), Some("req-42"));
            assert_eq!(current_command().as_deref(), Some("download"));
            "done"
        })
        .await;
        assert_eq!(output, "done");
        assert!(current_request_id().is_none());
        assert!(current_command().is_none());
    }
}
