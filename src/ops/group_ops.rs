use tracing::debug;

use crate::model::{ContactRecord, GroupDefinition};

/// Dissolves address-book group markers into a `group` tag on member records.
///
/// Marker records are removed from the result. Markers sharing a name are
/// merged. A record listed in several groups gets the group discovered first
/// in input order; this matches what existing phonebooks were built with.
/// Records matching no group keep whatever tag they had (normally none).
pub fn dissolve_groups(records: Vec<ContactRecord>) -> Vec<ContactRecord> {
    let mut groups: Vec<GroupDefinition> = Vec::new();
    let mut contacts: Vec<ContactRecord> = Vec::with_capacity(records.len());

    for mut record in records {
        match record.members.take() {
            Some(members) => match groups.iter_mut().find(|g| g.name == record.fullname) {
                Some(existing) => existing.absorb(members),
                None => groups.push(GroupDefinition::create(record.fullname, members)),
            },
            None => contacts.push(record),
        }
    }

    if groups.is_empty() {
        return contacts;
    }
    debug!(groups = groups.len(), contacts = contacts.len(), "dissolving address book groups");

    for contact in &mut contacts {
        if let Some(group) = groups.iter().find(|g| g.contains(&contact.uid)) {
            contact.group = Some(group.name.clone());
        }
    }
    contacts
}
