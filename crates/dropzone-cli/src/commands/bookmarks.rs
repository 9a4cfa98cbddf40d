use serde_json::json;

use crate::cli::{DropArgs, OutputFormat};
use crate::client::{AppContext, CliResult};
use crate::commands::load_detail;
use crate::output::render;

pub(crate) async fn handle_bookmark(ctx: &AppContext, args: DropArgs) -> CliResult<String> {
    let (_view, record) = load_detail(ctx, &args.id).await?;
    let outcome = ctx.catalog.toggle_bookmark(record.id()).await?;
    tracing::info!(
        drop_id = %outcome.drop_id,
        bookmarked = outcome.bookmarked,
        "bookmark toggled"
    );

    match ctx.output {
        OutputFormat::Json => render(
            &json!({
                "drop_id": outcome.drop_id,
                "title": record.title(),
                "bookmarked": outcome.bookmarked,
            }),
            ctx.output,
            |_| String::new(),
        ),
        OutputFormat::Table if outcome.bookmarked => {
            Ok(format!("Bookmarked '{}'", record.title()))
        }
        OutputFormat::Table => Ok(format!("Removed bookmark from '{}'", record.title())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::context_for;
    use crate::commands::test_fixtures::{drop_json, released, upcoming};
    use httpmock::prelude::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn bookmark_posts_toggle_and_reports_new_state() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/drops/7/");
            then.status(200).json_body(released(7, "Ownership primer"));
        });
        let toggle = server.mock(|when, then| {
            when.method(POST)
                .path("/api/drops/7/bookmark/")
                .header("x-request-id", "test-request");
            then.status(201)
                .json_body(serde_json::json!({"message": "Drop bookmarked"}));
        });
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_for(&server.base_url(), Some("t"), dir.path(), OutputFormat::Table);

        let output = handle_bookmark(&ctx, DropArgs { id: "7".into() })
            .await
            .expect("toggle succeeds");
        toggle.assert();
        assert_eq!(output, "Bookmarked 'Ownership primer'");
    }

    #[tokio::test]
    async fn removing_a_bookmark_reports_removal() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/drops/8/");
            then.status(200)
                .json_body(drop_json(8, "Lifetimes", "doc", true));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/drops/8/bookmark/");
            then.status(200)
                .json_body(serde_json::json!({"message": "Bookmark removed"}));
        });
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_for(&server.base_url(), None, dir.path(), OutputFormat::Json);

        let output = handle_bookmark(&ctx, DropArgs { id: "8".into() })
            .await
            .expect("toggle succeeds");
        let parsed: serde_json::Value = serde_json::from_str(&output).expect("json output");
        assert_eq!(parsed["bookmarked"], false);
        assert_eq!(parsed["drop_id"], "8");
    }

    #[tokio::test]
    async fn upcoming_drop_cannot_be_bookmarked() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/drops/9/");
            then.status(200).json_body(upcoming(9, "Next week"));
        });
        let toggle = server.mock(|when, then| {
            when.method(POST).path("/api/drops/9/bookmark/");
            then.status(201);
        });
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_for(&server.base_url(), None, dir.path(), OutputFormat::Table);

        let err = handle_bookmark(&ctx, DropArgs { id: "9".into() })
            .await
            .expect_err("upcoming drops are not toggleable");
        assert_eq!(err.exit_code(), 2);
        toggle.assert_calls(0);
    }

    #[tokio::test]
    async fn failed_toggle_is_a_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/drops/7/");
            then.status(200).json_body(released(7, "Ownership primer"));
        });
        server.mock(|when, then| {
            when.method(POST).path("/api/drops/7/bookmark/");
            then.status(500).json_body(serde_json::json!({"error": "db down"}));
        });
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_for(&server.base_url(), None, dir.path(), OutputFormat::Table);

        let err = handle_bookmark(&ctx, DropArgs { id: "7".into() })
            .await
            .expect_err("toggle fails");
        assert_eq!(err.exit_code(), 3);
        assert!(
            err.display_message()
                .starts_with("Failed to update bookmark.")
        );
    }
}
