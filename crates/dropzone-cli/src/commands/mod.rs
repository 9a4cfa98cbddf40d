//! Command handlers grouped by concern.

pub(crate) mod access;
pub(crate) mod bookmarks;
pub(crate) mod catalog;
pub(crate) mod session;

use anyhow::anyhow;
use dropzone_catalog::DetailView;
use dropzone_core::{DropId, DropRecord};

use crate::client::{AppContext, CliError, CliResult};

/// Mount a detail view for `id` and load its record.
///
/// The returned view must stay alive while the record is acted on, since
/// toggles and downloads require the drop to be loaded in a mounted view.
pub(crate) async fn load_detail(ctx: &AppContext, id: &str) -> CliResult<(DetailView, DropRecord)> {
    let id = id.trim();
    if id.is_empty() {
        return Err(CliError::validation("drop id must not be empty"));
    }
    let view = ctx.catalog.mount_detail(DropId::from(id));
    ctx.catalog.fetch_detail(&view).await?;
    let record = view
        .record()
        .ok_or_else(|| CliError::failure(anyhow!("drop {id} was not loaded")))?;
    Ok((view, record))
}
