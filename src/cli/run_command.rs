use std::path::Path;

use tracing::{error, info};

use crate::cli::context::CLIContext;
use crate::error::{SyncError, SyncResult};
use crate::import;
use crate::ops::image_ops::{self, DirectoryImageStore, ImageStore};
use crate::ops::{router_ops, sync_ops};

pub fn run(ctx: &CLIContext, contacts_path: &Path) -> SyncResult<()> {
    let config = &ctx.config;
    let router = ctx.router()?;

    let records = import::load_contacts(contacts_path)?;
    let fetched = records.len();
    let shortlisted = sync_ops::shortlist(records, &config.filters);

    let mut store = match &config.images.directory {
        Some(dir) => Some(DirectoryImageStore::new(dir)?),
        None => None,
    };
    let images = image_ops::publish_images(
        shortlisted,
        store.as_mut().map(|s| s as &mut dyn ImageStore),
    );
    let mut warnings = images.warnings;
    let (shortlisted, image_stats) = (images.records, images.stats);

    let snapshot = router_ops::fetch_snapshot(&router, &config.phonebook);
    let outcome = sync_ops::build_document(&shortlisted, &config.conversions, &config.phonebook, &snapshot)?;
    warnings.extend(outcome.warnings);

    match router_ops::upload_phonebook(&router, &outcome.document, &config.phonebook, ctx.confirmation()) {
        Ok(()) => {}
        Err(SyncError::UploadRejected { phonebook_id }) => {
            let saved = CLIContext::rejected_file_name();
            std::fs::write(&saved, outcome.document.to_xml()?)?;
            error!(%saved, "router rejected the phonebook, saved it for review");
            return Err(SyncError::UploadRejected { phonebook_id });
        }
        Err(e) => return Err(e),
    }

    info!(fetched, kept = shortlisted.len(), "sync finished");
    ctx.print_warnings(&warnings);
    println!("Contacts fetched: {}", fetched);
    println!("Contacts synced: {}", shortlisted.len());
    println!("Phonebook entries: {}", outcome.document.entries.len());
    println!("Images uploaded: {} of {}", image_stats.uploaded, image_stats.total);
    Ok(())
}
