use tracing::info;

use crate::config::ConversionRules;
use crate::error::SyncResult;
use crate::fritzbox::{self, PhonebookDocument};
use crate::model::{ContactRecord, FilterRuleSet, PhonebookMeta, PipelineWarning};
use crate::ops::quickdial_ops::{self, SnapshotState};
use crate::ops::{convert_ops, filter_ops, group_ops};

/// Result of turning a contact list into a phonebook document.
#[derive(Debug)]
pub struct BuildOutcome {
    pub document: PhonebookDocument,
    pub warnings: Vec<PipelineWarning>,
}

/// Group dissolution followed by filtering. Input order is preserved.
pub fn shortlist(records: Vec<ContactRecord>, filters: &FilterRuleSet) -> Vec<ContactRecord> {
    let fetched = records.len();
    let contacts = group_ops::dissolve_groups(records);
    let kept = filter_ops::apply(contacts, filters);
    info!(fetched, kept = kept.len(), "shortlisted contacts");
    kept
}

/// Conversion, quick-dial merge and assembly over an already shortlisted set.
pub fn build_document(
    records: &[ContactRecord],
    rules: &ConversionRules,
    meta: &PhonebookMeta,
    snapshot: &SnapshotState,
) -> SyncResult<BuildOutcome> {
    let entries = convert_ops::convert_all(records, rules)?;
    let merged = quickdial_ops::merge(entries, snapshot);
    let document = fritzbox::assemble(merged.entries, meta);
    info!(entries = document.entries.len(), phonebook = %meta.name, "assembled phonebook");

    Ok(BuildOutcome {
        document,
        warnings: merged.warning.into_iter().collect(),
    })
}

/// The whole transformation in one go, for callers with no image step in between.
pub fn build_phonebook(
    records: Vec<ContactRecord>,
    filters: &FilterRuleSet,
    rules: &ConversionRules,
    meta: &PhonebookMeta,
    snapshot: &SnapshotState,
) -> SyncResult<BuildOutcome> {
    let shortlisted = shortlist(records, filters);
    build_document(&shortlisted, rules, meta, snapshot)
}
