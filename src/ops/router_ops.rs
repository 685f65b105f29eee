use tracing::{info, warn};

use crate::error::{SyncError, SyncResult};
use crate::fritzbox::{PhonebookDocument, PhonebookRouter};
use crate::model::PhonebookMeta;
use crate::ops::quickdial_ops::SnapshotState;

/// Fetches the currently published phonebook. Transport failures degrade to
/// `Unavailable`: losing quick dials is not worth aborting the sync.
pub fn fetch_snapshot(router: &dyn PhonebookRouter, meta: &PhonebookMeta) -> SnapshotState {
    match router.export_phonebook(meta.id, &meta.name) {
        Ok(export) => SnapshotState::from_export(export.as_deref()),
        Err(e) => {
            warn!(phonebook_id = meta.id, error = %e, "could not load existing phonebook");
            SnapshotState::Unavailable(e.to_string())
        }
    }
}

pub fn upload_phonebook(
    router: &dyn PhonebookRouter,
    document: &PhonebookDocument,
    meta: &PhonebookMeta,
    confirmation: &str,
) -> SyncResult<()> {
    let xml = document.to_xml()?;
    upload_xml(router, &xml, meta.id, confirmation)
}

/// Uploads a serialized phonebook. A response without the confirmation text
/// is reported as `UploadRejected`, separate from transport errors.
pub fn upload_xml(
    router: &dyn PhonebookRouter,
    xml: &str,
    phonebook_id: u32,
    confirmation: &str,
) -> SyncResult<()> {
    let response = router.import_phonebook(phonebook_id, xml)?;
    if !response.contains(confirmation) {
        return Err(SyncError::UploadRejected {
            phonebook_id: phonebook_id.to_string(),
        });
    }
    info!(phonebook_id, "phonebook uploaded");
    Ok(())
}
