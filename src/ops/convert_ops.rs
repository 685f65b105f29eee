use tracing::{debug, error};

use crate::config::ConversionRules;
use crate::error::{SyncError, SyncResult};
use crate::model::{ContactRecord, NumberType, PhonebookEmail, PhonebookEntry, PhonebookNumber};
use crate::ops::filter_ops;

/// Maps one record to zero or more phonebook entries. Never touches the record.
///
/// Yields nothing when no name template resolves or the record has neither
/// numbers nor email addresses. Numbers beyond the per-entry limit spill into
/// further entries carrying the same name and uid.
pub fn convert(record: &ContactRecord, rules: &ConversionRules) -> Vec<PhonebookEntry> {
    let name = match resolve_name(record, &rules.real_name) {
        Some(n) => n,
        None => return Vec::new(),
    };

    let numbers: Vec<PhonebookNumber> = record
        .phones
        .iter()
        .filter_map(|p| {
            let number = rewrite_number(&p.number, &rules.phone_replace_characters);
            if number.is_empty() {
                None
            } else {
                Some(PhonebookNumber::new(number, classify_number(&p.types, rules)))
            }
        })
        .collect();

    let emails: Vec<PhonebookEmail> = record
        .emails
        .iter()
        .filter(|e| !e.address.trim().is_empty())
        .map(|e| PhonebookEmail {
            address: e.address.trim().to_string(),
            classifier: classify_email(&e.types, rules),
        })
        .collect();

    if numbers.is_empty() && emails.is_empty() {
        return Vec::new();
    }

    let vip = rules
        .vip
        .as_ref()
        .map(|vip| filter_ops::matches_any(record, vip))
        .unwrap_or(false);

    let image_url = match (&record.photo, &rules.image_url) {
        (Some(photo), Some(base)) if photo.is_jpeg() => {
            Some(format!("{}/{}.jpg", base.trim_end_matches('/'), record.uid))
        }
        _ => None,
    };

    let template = PhonebookEntry {
        uid: record.uid.clone(),
        name,
        vip,
        numbers: Vec::new(),
        emails: Vec::new(),
        image_url,
    };

    if numbers.is_empty() {
        return vec![PhonebookEntry { emails, ..template }];
    }

    let mut entries: Vec<PhonebookEntry> = numbers
        .chunks(rules.max_numbers_per_entry.max(1))
        .map(|chunk| PhonebookEntry {
            numbers: chunk.to_vec(),
            ..template.clone()
        })
        .collect();
    if let Some(first) = entries.first_mut() {
        first.emails = emails;
    }
    entries
}

/// Converts every record in order.
///
/// Fails once, not per record, when no record yields a name under the
/// configured templates: that points at the configuration rather than the data.
pub fn convert_all(records: &[ContactRecord], rules: &ConversionRules) -> SyncResult<Vec<PhonebookEntry>> {
    let mut entries = Vec::new();
    let mut unnamed = 0;

    for record in records {
        if resolve_name(record, &rules.real_name).is_none() {
            unnamed += 1;
            continue;
        }
        let converted = convert(record, rules);
        if converted.is_empty() {
            debug!(uid = %record.uid, "contact has nothing to put in the phonebook");
        }
        entries.extend(converted);
    }

    if !records.is_empty() && unnamed == records.len() {
        error!(records = records.len(), "no name template matched any contact");
        return Err(SyncError::Unmappable {
            records: records.len(),
        });
    }
    Ok(entries)
}

/// First template whose placeholders all resolve to non-blank values.
pub fn resolve_name(record: &ContactRecord, templates: &[String]) -> Option<String> {
    templates
        .iter()
        .find_map(|t| render_template(record, t))
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

fn render_template(record: &ContactRecord, template: &str) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        let close = match rest[open..].find('}') {
            Some(c) => open + c,
            None => break,
        };
        out.push_str(&rest[..open]);
        let placeholder = &rest[open + 1..close];
        let value = record.attribute(placeholder)?.first()?;
        out.push_str(value.trim());
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    Some(out)
}

fn rewrite_number(raw: &str, replacements: &[(String, String)]) -> String {
    let mut number = raw.trim().to_string();
    for (from, to) in replacements {
        if !from.is_empty() {
            number = number.replace(from.as_str(), to);
        }
    }
    number.trim().to_string()
}

/// The first type token with a mapping decides; unmapped numbers are `other`.
fn classify_number(types: &[String], rules: &ConversionRules) -> NumberType {
    types
        .iter()
        .find_map(|t| rules.phone_types.get(&t.to_ascii_uppercase()).copied())
        .unwrap_or(NumberType::Other)
}

fn classify_email(types: &[String], rules: &ConversionRules) -> String {
    types
        .iter()
        .find_map(|t| rules.email_types.get(&t.to_ascii_uppercase()))
        .cloned()
        .unwrap_or_else(|| "private".to_string())
}
