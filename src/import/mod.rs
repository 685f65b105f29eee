use std::collections::BTreeMap;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::model::*;

/// Fields read into dedicated `ContactRecord` members; everything else that is
/// a string or a list of strings becomes a generic attribute.
const KNOWN_FIELDS: &[&str] = &[
    "uid",
    "fullname",
    "firstname",
    "lastname",
    "nickname",
    "organization",
    "phones",
    "emails",
    "categories",
    "photo",
    "photo_path",
    "photo_type",
    "members",
    "group",
];

/// Loads address-book records exported by the CardDAV client as JSON.
///
/// Accepts either a bare array of cards or an object with a `cards` array.
/// `photo_path` entries are resolved relative to the JSON file.
pub fn load_contacts(json_path: &Path) -> SyncResult<Vec<ContactRecord>> {
    let json_str = std::fs::read_to_string(json_path)?;
    let json: Value = serde_json::from_str(&json_str)?;
    let base_dir = json_path.parent().unwrap_or_else(|| Path::new("."));
    let records = parse_cards(&json, base_dir)?;
    debug!(path = %json_path.display(), count = records.len(), "loaded contacts");
    Ok(records)
}

pub fn parse_cards(json: &Value, base_dir: &Path) -> SyncResult<Vec<ContactRecord>> {
    let cards = match json {
        Value::Array(arr) => arr,
        Value::Object(obj) => obj
            .get("cards")
            .and_then(|v| v.as_array())
            .ok_or_else(|| SyncError::Other("Missing cards array".into()))?,
        _ => return Err(SyncError::Other("Contacts file must hold an array of cards".into())),
    };

    cards.iter().map(|card| parse_card(card, base_dir)).collect()
}

fn parse_card(card: &Value, base_dir: &Path) -> SyncResult<ContactRecord> {
    let obj = card
        .as_object()
        .ok_or_else(|| SyncError::Other("Card must be a JSON object".into()))?;

    let uid = match card["uid"].as_str().map(str::trim) {
        Some(u) if !u.is_empty() => Uid::new(u),
        _ => Uid::generate(),
    };
    let fullname = card["fullname"].as_str().unwrap_or("").trim().to_string();

    let mut record = ContactRecord::create(uid, fullname);
    record.firstname = optional_str(card, "firstname");
    record.lastname = optional_str(card, "lastname");
    record.nickname = optional_str(card, "nickname");
    record.organization = optional_str(card, "organization");
    record.group = optional_str(card, "group");
    record.categories = string_list(&card["categories"]);

    if let Some(phones) = card["phones"].as_array() {
        record.phones = phones
            .iter()
            .filter_map(|p| match p {
                Value::String(s) => Some(PhoneNumber {
                    number: s.clone(),
                    types: Vec::new(),
                }),
                Value::Object(_) => p["number"].as_str().map(|n| PhoneNumber {
                    number: n.to_string(),
                    types: string_list(&p["types"]),
                }),
                _ => None,
            })
            .collect();
    }

    if let Some(emails) = card["emails"].as_array() {
        record.emails = emails
            .iter()
            .filter_map(|e| match e {
                Value::String(s) => Some(EmailAddress {
                    address: s.clone(),
                    types: Vec::new(),
                }),
                Value::Object(_) => e["address"].as_str().map(|a| EmailAddress {
                    address: a.to_string(),
                    types: string_list(&e["types"]),
                }),
                _ => None,
            })
            .collect();
    }

    record.photo = parse_photo(card, base_dir, &record.uid);

    // Group markers carry their member uids, sometimes as `urn:uuid:` URIs.
    if let Some(members) = card.get("members") {
        record.members = Some(
            string_list(members)
                .into_iter()
                .map(|m| Uid::new(m.strip_prefix("urn:uuid:").unwrap_or(m.as_str())))
                .collect(),
        );
    }

    record.attributes = obj
        .iter()
        .filter(|(key, _)| !KNOWN_FIELDS.contains(&key.as_str()))
        .filter_map(|(key, value)| attribute_value(value).map(|v| (key.clone(), v)))
        .collect::<BTreeMap<_, _>>();

    Ok(record)
}

fn parse_photo(card: &Value, base_dir: &Path, uid: &Uid) -> Option<Photo> {
    let media_type = optional_str(card, "photo_type");

    if let Some(encoded) = card["photo"].as_str() {
        // Accept data URIs as well as bare base64.
        let payload = encoded.split_once("base64,").map(|(_, b)| b).unwrap_or(encoded);
        let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
        return match STANDARD.decode(cleaned.as_bytes()) {
            Ok(data) => Some(Photo { data, media_type }),
            Err(e) => {
                warn!(%uid, error = %e, "ignoring undecodable photo");
                None
            }
        };
    }

    let path = card["photo_path"].as_str()?;
    match std::fs::read(base_dir.join(path)) {
        Ok(data) => Some(Photo { data, media_type }),
        Err(e) => {
            warn!(%uid, path, error = %e, "ignoring unreadable photo");
            None
        }
    }
}

fn optional_str(card: &Value, field: &str) -> Option<String> {
    card[field]
        .as_str()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(arr) => arr
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

fn attribute_value(value: &Value) -> Option<AttributeValue> {
    match value {
        Value::String(s) => Some(AttributeValue::Single(s.clone())),
        Value::Array(_) => Some(AttributeValue::Multi(string_list(value))),
        Value::Bool(b) => Some(AttributeValue::Single(b.to_string())),
        Value::Number(n) => Some(AttributeValue::Single(n.to_string())),
        _ => None,
    }
}
