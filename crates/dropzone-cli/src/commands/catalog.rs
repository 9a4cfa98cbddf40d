use crate::cli::DropArgs;
use crate::client::{AppContext, CliResult};
use crate::commands::load_detail;
use crate::output::{bookmarks_table, dashboard_table, detail_table, render};

pub(crate) async fn handle_dashboard(ctx: &AppContext) -> CliResult<String> {
    let view = ctx.catalog.mount_dashboard();
    ctx.catalog.fetch_catalog(&view).await?;
    render(&view.project(), ctx.output, dashboard_table)
}

pub(crate) async fn handle_bookmarks(ctx: &AppContext) -> CliResult<String> {
    let view = ctx.catalog.mount_bookmarks();
    ctx.catalog.fetch_bookmarks(&view).await?;
    render(&view.project(), ctx.output, bookmarks_table)
}

pub(crate) async fn handle_show(ctx: &AppContext, args: DropArgs) -> CliResult<String> {
    let (view, _) = load_detail(ctx, &args.id).await?;
    render(&view.project(), ctx.output, detail_table)
}
