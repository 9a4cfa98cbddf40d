use crate::cli::{DownloadArgs, OpenArgs, OutputFormat};
use crate::client::{AppContext, CliResult};
use crate::commands::load_detail;
use crate::opener::LaunchMode;
use crate::output::{format_bytes, render};

pub(crate) async fn handle_download(ctx: &AppContext, args: DownloadArgs) -> CliResult<String> {
    let (_view, record) = load_detail(ctx, &args.id).await?;
    let saved = ctx.catalog.request_download(&record).await?;
    render(&saved, ctx.output, |saved| {
        format!(
            "Saved '{}' to {} ({})",
            record.title(),
            saved.path.display(),
            format_bytes(saved.bytes)
        )
    })
}

pub(crate) async fn handle_open(ctx: &AppContext, args: OpenArgs) -> CliResult<String> {
    let (_view, record) = load_detail(ctx, &args.id).await?;
    let navigation = ctx.catalog.request_external_open(&record).await?;
    match (ctx.output, ctx.launch_mode) {
        (OutputFormat::Json, _) => render(&navigation, ctx.output, |_| String::new()),
        (OutputFormat::Table, LaunchMode::Print) => Ok(navigation.url.to_string()),
        (OutputFormat::Table, LaunchMode::Browser) => {
            Ok(format!("Opened {} in your browser", navigation.url))
        }
    }
}
