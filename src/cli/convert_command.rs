use std::path::Path;

use tracing::info;

use crate::cli::context::CLIContext;
use crate::error::SyncResult;
use crate::import;
use crate::ops::quickdial_ops::SnapshotState;
use crate::ops::sync_ops;

pub fn convert(
    ctx: &CLIContext,
    contacts_path: &Path,
    snapshot_path: Option<&Path>,
    output: Option<&Path>,
) -> SyncResult<()> {
    let records = import::load_contacts(contacts_path)?;
    let fetched = records.len();

    let export = match snapshot_path {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let snapshot = SnapshotState::from_export(export.as_deref());

    let config = &ctx.config;
    let outcome = sync_ops::build_phonebook(
        records,
        &config.filters,
        &config.conversions,
        &config.phonebook,
        &snapshot,
    )?;
    let xml = outcome.document.to_xml()?;

    match output {
        Some(path) => {
            std::fs::write(path, &xml)?;
            info!(path = %path.display(), "phonebook written");
            ctx.print_warnings(&outcome.warnings);
            println!(
                "Converted {} contacts into {} phonebook entries: {}",
                fetched,
                outcome.document.entries.len(),
                path.display()
            );
        }
        None => {
            ctx.print_warnings(&outcome.warnings);
            println!("{}", xml);
        }
    }
    Ok(())
}
