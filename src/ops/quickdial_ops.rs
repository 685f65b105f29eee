use std::collections::HashMap;

use tracing::{debug, warn};

use crate::fritzbox::phonebook_xml;
use crate::model::{PhonebookEntry, PipelineWarning, QuickDialKey, Uid};

/// Quick dials read from the phonebook currently published on the router.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePhonebookSnapshot {
    quick_dials: HashMap<QuickDialKey, String>,
}

impl RemotePhonebookSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raw_number: &str, uid: &Uid, quick_dial: impl Into<String>) {
        self.quick_dials
            .insert(QuickDialKey::new(raw_number, uid), quick_dial.into());
    }

    pub fn quick_dial(&self, key: &QuickDialKey) -> Option<&str> {
        self.quick_dials.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.quick_dials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quick_dials.is_empty()
    }
}

/// What the remote fetch handed us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotState {
    Available(RemotePhonebookSnapshot),
    Unavailable(String),
}

impl SnapshotState {
    /// Interprets a raw phonebook export. Anything that is not a parsable XML
    /// phonebook degrades to `Unavailable` rather than failing the run.
    pub fn from_export(export: Option<&str>) -> Self {
        let body = match export {
            Some(b) => b.trim_start_matches('\u{feff}').trim_start(),
            None => return SnapshotState::Unavailable("router returned no phonebook".into()),
        };
        if !body.starts_with("<?xml") {
            return SnapshotState::Unavailable("router response is not an XML phonebook".into());
        }
        match phonebook_xml::parse_snapshot(body) {
            Ok(snapshot) => SnapshotState::Available(snapshot),
            Err(e) => SnapshotState::Unavailable(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub entries: Vec<PhonebookEntry>,
    pub warning: Option<PipelineWarning>,
}

/// Reattaches quick dials to freshly converted entries, number by number.
///
/// Every number is looked up on its own, so a quick dial can never leak onto
/// a sibling number of the same contact. Unmatched numbers end up unset.
pub fn merge(entries: Vec<PhonebookEntry>, snapshot: &SnapshotState) -> MergeOutcome {
    let snapshot = match snapshot {
        SnapshotState::Available(s) => s,
        SnapshotState::Unavailable(reason) => {
            warn!(%reason, "existing phonebook unavailable, quick dials will not be preserved");
            let entries = entries.into_iter().map(clear_quick_dials).collect();
            return MergeOutcome {
                entries,
                warning: Some(PipelineWarning::SnapshotUnavailable {
                    reason: reason.clone(),
                }),
            };
        }
    };

    let mut restored = 0;
    let entries = entries
        .into_iter()
        .map(|mut entry| {
            for number in &mut entry.numbers {
                let key = QuickDialKey::new(&number.number, &entry.uid);
                number.quick_dial = snapshot.quick_dial(&key).map(str::to_string);
                if number.quick_dial.is_some() {
                    restored += 1;
                }
            }
            entry
        })
        .collect();

    debug!(restored, known = snapshot.len(), "restored quick dials");
    MergeOutcome {
        entries,
        warning: None,
    }
}

fn clear_quick_dials(mut entry: PhonebookEntry) -> PhonebookEntry {
    for number in &mut entry.numbers {
        number.quick_dial = None;
    }
    entry
}
