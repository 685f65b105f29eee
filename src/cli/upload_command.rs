use std::path::Path;

use tracing::info;

use crate::cli::context::CLIContext;
use crate::error::SyncResult;
use crate::fritzbox::parse_snapshot;
use crate::ops::router_ops;

pub fn upload(ctx: &CLIContext, filename: &Path) -> SyncResult<()> {
    let xml = std::fs::read_to_string(filename)?;
    // Refuse to send something the router's importer would choke on.
    parse_snapshot(&xml)?;

    let router = ctx.router()?;
    info!(file = %filename.display(), "uploading phonebook");
    router_ops::upload_xml(&router, &xml, ctx.config.phonebook.id, ctx.confirmation())?;
    println!("Uploaded {} to phonebook '{}'", filename.display(), ctx.config.phonebook.name);
    Ok(())
}
