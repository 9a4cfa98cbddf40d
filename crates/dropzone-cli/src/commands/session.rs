use anyhow::Context as _;
use dropzone_core::{DropService, display_name_hint};
use serde_json::json;

use crate::client::{AppContext, CliError, CliResult};
use crate::output::render;

pub(crate) fn handle_whoami(ctx: &AppContext) -> CliResult<String> {
    let token = ctx.access_token.as_deref().ok_or_else(|| {
        CliError::validation("access token is required (pass --token or set DROPZONE_TOKEN)")
    })?;
    let name = display_name_hint(token);
    render(&json!({ "display_name": name }), ctx.output, |_| {
        format!("Signed in as {name}")
    })
}

pub(crate) async fn handle_health(ctx: &AppContext) -> CliResult<String> {
    let status = ctx
        .service
        .health()
        .await
        .context("health check failed")
        .map_err(CliError::failure)?;
    render(&status, ctx.output, |status| match &status.message {
        Some(message) => format!("status: {} ({message})", status.status),
        None => format!("status: {}", status.status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::client::test_support::context_for;
    use base64::Engine as _;
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn token_with(claims: &serde_json::Value) -> String {
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!(
            "{}.{}.sig",
            engine.encode(br#"{"alg":"HS256"}"#),
            engine.encode(claims.to_string())
        )
    }

    #[test]
    fn whoami_prefers_email() {
        let dir = TempDir::new().expect("temp dir");
        let token = token_with(&json!({"email": "ada@example.com", "username": "ada"}));
        let ctx = context_for(
            "http://127.0.0.1:9",
            Some(&token),
            dir.path(),
            OutputFormat::Table,
        );
        assert_eq!(
            handle_whoami(&ctx).expect("whoami"),
            "Signed in as ada@example.com"
        );
    }

    #[test]
    fn whoami_requires_token() {
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_for("http://127.0.0.1:9", None, dir.path(), OutputFormat::Table);
        let err = handle_whoami(&ctx).expect_err("token required");
        assert_eq!(err.exit_code(), 2);
    }

    #[tokio::test]
    async fn health_reports_status() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/api/health/");
            then.status(200)
                .json_body(json!({"status": "healthy", "message": "DropZone API is running"}));
        });
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_for(&server.base_url(), None, dir.path(), OutputFormat::Table);

        let output = handle_health(&ctx).await.expect("health");
        mock.assert();
        assert_eq!(output, "status: healthy (DropZone API is running)");
    }

    #[tokio::test]
    async fn unreachable_service_is_a_failure() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/api/health/");
            then.status(502);
        });
        let dir = TempDir::new().expect("temp dir");
        let ctx = context_for(&server.base_url(), None, dir.path(), OutputFormat::Table);

        let err = handle_health(&ctx).await.expect_err("bad gateway");
        assert_eq!(err.exit_code(), 3);
        assert!(err.display_message().starts_with("health check failed"));
    }
}
